mod common;

crate::tests! {
    plus_coerces_a_number_onto_a_string: "operator/string_coercion.lox" is OK => "a1\n",
}

crate::tests! {
    division_by_zero_is_runtime_error:
        "operator/divide_by_zero.lox" is ERR => "[line 1] Error at '/': Divisor must not be zero.\n",
    comparing_a_number_to_a_string_is_runtime_error:
        "operator/comparison_type_error.lox" is ERR
        => "[line 1] Error at '<': Operands must be two numbers or two strings.\n",
}
