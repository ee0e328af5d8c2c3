//! Log-friendly rendering of the protoc command line.

/// Placeholder substituted for the working directory in logged commands.
pub const PWD_PLACEHOLDER: &str = "$(pwd)";

/// Replace every literal occurrence of `base` in `text` with `placeholder`.
///
/// Purely cosmetic. An empty `base` leaves `text` unchanged.
pub fn abbreviate(text: &str, base: &str, placeholder: &str) -> String {
    if base.is_empty() {
        return text.to_string();
    }
    text.replace(base, placeholder)
}

/// `<program> <args joined by spaces>`, with `base` abbreviated.
pub fn display_command<S: AsRef<std::ffi::OsStr>>(
    program: &str,
    args: &[S],
    base: &str,
    placeholder: &str,
) -> String {
    let joined = args
        .iter()
        .map(|a| a.as_ref().to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{} {}", program, abbreviate(&joined, base, placeholder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_replaces_every_occurrence() {
        assert_eq!(
            abbreviate("--proto_path=/src/api --go_out=/src/api/gen", "/src/api", "$(pwd)"),
            "--proto_path=$(pwd) --go_out=$(pwd)/gen"
        );
    }

    #[test]
    fn test_abbreviate_without_match_is_identity() {
        let text = "--go_out=. a.proto";
        assert_eq!(abbreviate(text, "/src/api", "$(pwd)"), text);
    }

    #[test]
    fn test_abbreviate_empty_base() {
        assert_eq!(abbreviate("a.proto", "", "$(pwd)"), "a.proto");
    }

    #[test]
    fn test_abbreviate_custom_placeholder() {
        assert_eq!(abbreviate("/w/x.proto", "/w", "<cwd>"), "<cwd>/x.proto");
    }

    #[test]
    fn test_display_command() {
        let args = ["--proto_path=/src/api", "a.proto"];
        assert_eq!(
            display_command("protoc", &args, "/src/api", PWD_PLACEHOLDER),
            "protoc --proto_path=$(pwd) a.proto"
        );
    }

    #[test]
    fn test_display_command_no_args() {
        let args: [&str; 0] = [];
        assert_eq!(display_command("protoc", &args, "/x", PWD_PLACEHOLDER), "protoc ");
    }
}
