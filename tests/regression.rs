mod common;

crate::tests! {
    nil_equals_only_nil: "regression/nil_equality.lox" is OK => "true\nfalse\n",
    anonymous_function_expression_is_callable: "regression/anonymous_function.lox" is OK => "7\n",
}
