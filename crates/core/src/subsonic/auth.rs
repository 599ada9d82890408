//! Subsonic token authentication.

use uuid::Uuid;

/// Protocol version sent with every request.
const API_VERSION: &str = "1.16.1";

/// Client identifier sent with every request.
const CLIENT_NAME: &str = "cadenza";

/// Build the authentication query parameters for one request.
///
/// Subsonic token auth: a fresh random salt per request and
/// `t = md5(password + salt)`, so the password never travels on the wire.
pub fn auth_params(username: &str, password: &str) -> Vec<(String, String)> {
    let salt = Uuid::new_v4().simple().to_string();
    params_with_salt(username, password, &salt)
}

fn params_with_salt(username: &str, password: &str, salt: &str) -> Vec<(String, String)> {
    let token = format!("{:x}", md5::compute(format!("{password}{salt}")));
    vec![
        ("u".to_string(), username.to_string()),
        ("t".to_string(), token),
        ("s".to_string(), salt.to_string()),
        ("v".to_string(), API_VERSION.to_string()),
        ("c".to_string(), CLIENT_NAME.to_string()),
        ("f".to_string(), "json".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_md5_of_password_and_salt() {
        // md5("sesame" + "c19b2d") - known vector
        let params = params_with_salt("admin", "sesame", "c19b2d");
        let token = params.iter().find(|(k, _)| k == "t").map(|(_, v)| v.clone());
        let expected = format!("{:x}", md5::compute("sesamec19b2d"));
        assert_eq!(token.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_params_carry_protocol_fields() {
        let params = auth_params("admin", "secret");
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        assert_eq!(get("u"), "admin");
        assert_eq!(get("v"), "1.16.1");
        assert_eq!(get("c"), "cadenza");
        assert_eq!(get("f"), "json");
        // 32 hex chars from uuid v4 simple format
        assert_eq!(get("s").len(), 32);
        assert_eq!(get("t").len(), 32);
    }

    #[test]
    fn test_salt_changes_per_call() {
        let a = auth_params("admin", "secret");
        let b = auth_params("admin", "secret");
        let salt = |p: &[(String, String)]| {
            p.iter()
                .find(|(k, _)| k == "s")
                .map(|(_, v)| v.clone())
                .unwrap()
        };
        assert_ne!(salt(&a), salt(&b));
    }
}
