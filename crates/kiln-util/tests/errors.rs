use kiln_util::errors::KilnError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = KilnError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_manifest_error_display() {
    let err = KilnError::Manifest {
        message: "bad syntax".to_string(),
    };
    assert_eq!(err.to_string(), "Manifest error: bad syntax");
}

#[test]
fn test_resolution_error_display() {
    let err = KilnError::Resolution {
        message: "conflict".to_string(),
    };
    assert_eq!(err.to_string(), "Dependency resolution failed: conflict");
}

#[test]
fn test_build_error_display() {
    let err = KilnError::Build {
        message: "2 module(s) failed".to_string(),
    };
    assert_eq!(err.to_string(), "Build failed: 2 module(s) failed");
}

#[test]
fn test_repository_error_display() {
    let err = KilnError::Repository {
        message: "checksum mismatch".to_string(),
    };
    assert_eq!(err.to_string(), "Repository error: checksum mismatch");
}

#[test]
fn test_generic_error_display() {
    let err = KilnError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let kiln_err: KilnError = io_err.into();
    assert!(matches!(kiln_err, KilnError::Io(_)));
}
