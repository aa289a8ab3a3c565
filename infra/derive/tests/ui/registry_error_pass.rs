use creg_derive::registry_error;
use std::borrow::Cow;

#[registry_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Duplicate entry '{key}' at index {index}{}", format_context(.context))]
    Duplicate { key: String, index: usize, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<String, DemoError> {
    std::fs::read_to_string("/nonexistent").context("reading fixture")
}

fn main() {
    let err = read().unwrap_err();
    assert!(err.to_string().contains("(reading fixture)"));

    let dup = DemoError::Duplicate { key: "a".to_owned(), index: 1, context: None }
        .with_context("certs");
    assert_eq!(dup.to_string(), "Duplicate entry 'a' at index 1 (certs)");

    let internal: DemoError = "boom".into();
    assert!(matches!(internal, DemoError::Internal { .. }));
}
