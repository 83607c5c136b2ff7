mod common;

crate::tests! {
    variable_sum: "variable/basic.lox" is OK => "3\n",
}

crate::tests! {
    uninitialized_read_is_runtime_error:
        "variable/uninitialized_read_is_error.lox" is ERR
        => "[line 2] Error at 'a': Variable 'a' used before it was initialized.\n",
}
