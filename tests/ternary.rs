mod common;

// This dialect's ternary takes no `:` — `cond ? then else`.
crate::tests! {
    ternary_without_colon: "ternary/no_colon.lox" is OK => "1\n",
}
