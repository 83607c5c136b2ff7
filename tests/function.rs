mod common;

crate::tests! {
    recursive_fibonacci: "function/recursion_fib.lox" is OK => "55\n",
    closure_over_parameter: "function/closure_over_parameter.lox" is OK => "7\n",
}

crate::tests! {
    arity_mismatch_is_runtime_error:
        "function/arity_mismatch.lox" is ERR
        => "[line 2] Error at ')': Expected 2 arguments but got 1.\n",
}
