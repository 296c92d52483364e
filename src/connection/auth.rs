use serde::Serialize;

/// Sign-in credentials for the store's root authentication scope.
///
/// Scoped/user authentication flows live with the auth service, outside this
/// layer; the data layer only ever signs in once per connection.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "user")]
    pub username: String,
    #[serde(rename = "pass")]
    pub password: String,
}

impl Credentials {
    pub fn root(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}
