mod common;

// A block comment that spans multiple lines must still leave the line
// counter correct for whatever follows it.
crate::tests! {
    block_comment_is_skipped: "comment/block_comment.lox" is OK => "1\n",
}
