mod common;

// The canonical closure test: `showA` must keep printing the `a` that
// was in scope when it was declared, not whatever `a` happens to be
// the second time it's called.
crate::tests! {
    closure_captures_definition_scope: "closure/closure.lox" is OK => "global\nglobal\n",
}
