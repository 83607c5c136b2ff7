mod common;

crate::tests! {
    unexpected_character_is_a_scan_error:
        "misc/unexpected_character.lox" is ERR => "[line 1] Error: Unexpected character '@'\n",
}
