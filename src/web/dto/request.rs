//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::no_control_chars;

/// Query string carrying the directory an operation works in.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PathQuery {
    /// Directory relative to the storage root, `/`-separated. Empty for the root.
    #[serde(default)]
    pub path: String,
}

/// Create directory request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct MkdirRequest {
    /// Parent directory relative to the storage root.
    #[serde(default)]
    pub path: String,
    /// Name of the new directory (single segment).
    #[validate(
        length(min = 1, max = 255, message = "Folder name must be 1-255 characters"),
        custom(function = "no_control_chars")
    )]
    pub name: String,
}

/// Rename request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// Directory containing the entry.
    #[serde(default)]
    pub path: String,
    /// Current entry name.
    #[validate(length(min = 1, max = 255, message = "Old name must be 1-255 characters"))]
    pub old_name: String,
    /// New entry name.
    #[validate(
        length(min = 1, max = 255, message = "New name must be 1-255 characters"),
        custom(function = "no_control_chars")
    )]
    pub new_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_request_camel_case() {
        let req: RenameRequest = serde_json::from_str(
            r#"{"path": "docs", "oldName": "a.txt", "newName": "b.txt"}"#,
        )
        .unwrap();
        assert_eq!(req.path, "docs");
        assert_eq!(req.old_name, "a.txt");
        assert_eq!(req.new_name, "b.txt");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_mkdir_request_path_defaults_to_root() {
        let req: MkdirRequest = serde_json::from_str(r#"{"name": "docs"}"#).unwrap();
        assert_eq!(req.path, "");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_mkdir_request_rejects_empty_name() {
        let req: MkdirRequest = serde_json::from_str(r#"{"path": "", "name": ""}"#).unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_mkdir_request_rejects_control_chars() {
        let req = MkdirRequest {
            path: String::new(),
            name: "bad\u{7}name".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
