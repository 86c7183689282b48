/// Creates a single chat [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use parley::{Role, parley_msg};
///
/// let message = parley_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.content, "Done.");
///
/// let result = parley_msg!(function "http_get" => "{\"output\":\"ok\"}");
/// assert_eq!(result.name.as_deref(), Some("http_get"));
/// ```
#[macro_export]
macro_rules! parley_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::system($content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::user($content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::assistant($content)
    };
    (function $name:expr => $content:expr $(,)?) => {
        $crate::Message::function_result($name, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, assistant, or function <name>");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use parley::{Role, parley_messages};
///
/// let messages = parley_messages![
///     system => "You are concise.",
///     user => "2+2?",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::System);
/// assert_eq!(messages[1].role, Role::User);
/// ```
#[macro_export]
macro_rules! parley_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::parley_msg!($role => $content)),+]
    };
}

/// Declares a [`FunctionDefinition`](crate::FunctionDefinition) with an inline
/// JSON schema for its parameters.
///
/// ```rust
/// use parley::parley_function;
///
/// let definition = parley_function!(
///     "lookup",
///     "Looks a word up",
///     {
///         "type": "object",
///         "properties": { "word": { "type": "string" } },
///         "required": ["word"]
///     }
/// );
///
/// assert_eq!(definition.name, "lookup");
/// assert!(definition.parameters.contains("\"required\""));
/// ```
#[macro_export]
macro_rules! parley_function {
    ($name:expr, $description:expr, $($schema:tt)+) => {
        $crate::FunctionDefinition::new(
            $name,
            $description,
            $crate::__private::serde_json::json!($($schema)+).to_string(),
        )
    };
}
