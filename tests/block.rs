mod common;

crate::tests! {
    shadowing_in_nested_block: "block/shadowing.lox" is OK => "inner\nouter\n",
}
