//! Toast notifications shown after an authentication attempt.

use super::ClientError;

/// Action a notice reports on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
}

impl Action {
    fn success(self) -> &'static str {
        match self {
            Action::Login => "Successfully logged in",
            Action::Register => "Account created successfully!",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Action::Login => "Failed to login.",
            Action::Register => "Failed to create account.",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    /// Build the notice for `action` from its outcome.
    ///
    /// Errors show the API `message` when there is one.
    pub fn from_result<T>(action: Action, result: &Result<T, ClientError>) -> Self {
        match result {
            Ok(_) => Notice::Success(action.success().to_owned()),
            Err(err) => Notice::Error(
                err.api_message().unwrap_or(action.fallback()).to_owned(),
            ),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Notice::Success(text) | Notice::Error(text) => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::error::ResponseError;

    fn api_error(message: Option<&str>) -> ClientError {
        ClientError::Api {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: message.map(|message| {
                serde_json::from_value::<ResponseError>(
                    serde_json::json!({ "message": message }),
                )
                .unwrap()
            }),
        }
    }

    #[test]
    fn test_success() {
        assert_eq!(
            Notice::from_result::<()>(Action::Login, &Ok(())),
            Notice::Success("Successfully logged in".into())
        );
        assert_eq!(
            Notice::from_result::<()>(Action::Register, &Ok(())).text(),
            "Account created successfully!"
        );
    }

    #[test]
    fn test_error_uses_api_message() {
        let result: Result<(), _> =
            Err(api_error(Some("The provided credentials are incorrect.")));
        assert_eq!(
            Notice::from_result(Action::Login, &result),
            Notice::Error("The provided credentials are incorrect.".into())
        );
    }

    #[test]
    fn test_error_fallback() {
        let result: Result<(), _> = Err(api_error(None));
        assert_eq!(
            Notice::from_result(Action::Login, &result).text(),
            "Failed to login."
        );

        let result: Result<(), _> = Err(api_error(Some("")));
        assert_eq!(
            Notice::from_result(Action::Register, &result).text(),
            "Failed to create account."
        );
    }
}
