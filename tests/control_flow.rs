mod common;

crate::tests! {
    for_loop_counts_up: "control_flow/for_loop.lox" is OK => "0\n1\n2\n",
    while_loop_breaks_early: "control_flow/while_break.lox" is OK => "0\n1\n2\n",
    or_short_circuits_on_truthy_left: "control_flow/short_circuit.lox" is OK => "x\ntrue\ntrue\n",
}
