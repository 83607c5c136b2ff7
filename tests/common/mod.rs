use assert_cmd::Command;

/// Runs the `rlox` binary against a fixture script under `tests/target/`
/// and returns its captured output.
pub fn run(relative_path: &str) -> assert_cmd::assert::Assert {
    Command::cargo_bin("rlox").unwrap().arg(format!("tests/target/{relative_path}")).assert()
}

/// Declares one `#[test]` function per script fixture.
///
/// `name: "scope/file.lox" is OK => "expected stdout"` runs the script
/// and asserts it exits successfully with exactly that stdout.
/// `name: "scope/file.lox" is ERR => "expected stderr"` asserts a
/// non-zero exit and that exact stderr.
#[macro_export]
macro_rules! tests {
    ($($name:ident: $path:literal is OK => $expected:expr),* $(,)?) => {
        $(
            #[test]
            fn $name() {
                $crate::common::run($path).success().stdout($expected);
            }
        )*
    };
    ($($name:ident: $path:literal is ERR => $expected:expr),* $(,)?) => {
        $(
            #[test]
            fn $name() {
                $crate::common::run($path).failure().stderr($expected);
            }
        )*
    };
}
