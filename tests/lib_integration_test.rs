//! Integration tests for the torch_demos public API

use torch_demos::{DemoError, Result, DESCRIPTION, NAME, VERSION};

#[test]
fn test_library_metadata() {
    assert!(!VERSION.is_empty());
    assert_eq!(NAME, "torch_demos");
    assert!(!DESCRIPTION.is_empty());
}

#[test]
fn test_error_types() {
    let shape_error = DemoError::Shape("bad shape".to_string());
    assert!(matches!(shape_error, DemoError::Shape(_)));
    assert_eq!(shape_error.to_string(), "Shape error: bad shape");

    let io_error: DemoError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io_error, DemoError::Io(_)));
}

#[test]
fn test_result_type_alias() {
    let success: Result<i32> = Ok(42);
    assert_eq!(success.unwrap(), 42);

    let failure: Result<i32> = Err(DemoError::Config("test".to_string()));
    assert!(failure.is_err());
}
