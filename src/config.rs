//! Version info and REPL banner text.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const WELCOME_MESSAGE: &str = "islisp-core REPL";
pub const WELCOME_SUBTITLE: &str = "A Lisp-2 ISLISP-family interpreter core";

pub const HELP_TEXT: &str = r#"
Type any expression to evaluate it. Use Ctrl-D or (exit) to leave.
"#;
