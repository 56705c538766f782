//! LDAP bind credentials: configured, or asked for on the terminal.

use std::io::{self, Write};

use adpass_ldap::LdapSettings;

/// Use the configured bind user and password, prompting for whichever is
/// missing. The password prompt does not echo.
pub fn bind_credentials(ldap: &LdapSettings) -> io::Result<(String, String)> {
  resolve(ldap, prompt_line, |label| rpassword::prompt_password(label))
}

fn resolve(
  ldap: &LdapSettings,
  ask_user: impl FnOnce(&str) -> io::Result<String>,
  ask_password: impl FnOnce(&str) -> io::Result<String>,
) -> io::Result<(String, String)> {
  let user = match &ldap.bind_user {
    Some(user) => user.clone(),
    None => ask_user("Enter AD bind user name (<USERNAME>@<YOUR DOMAIN>): ")?,
  };
  let password = match &ldap.bind_password {
    Some(password) => password.clone(),
    None => ask_password("Enter AD bind user password: ")?,
  };
  Ok((user, password))
}

/// Print `label` and read the answer from stdin, echoed.
fn prompt_line(label: &str) -> io::Result<String> {
  print!("{label}");
  io::stdout().flush()?;
  let mut answer = String::new();
  io::stdin().read_line(&mut answer)?;
  Ok(answer.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn settings(user: Option<&str>, password: Option<&str>) -> LdapSettings {
    LdapSettings {
      host:                 "dc1.example.com".into(),
      port:                 None,
      use_ssl:              false,
      base_dn:              "DC=example,DC=com".into(),
      filter:               "(objectClass=user)".into(),
      connect_timeout_secs: 10,
      page_size:            500,
      bind_user:            user.map(String::from),
      bind_password:        password.map(String::from),
    }
  }

  fn never(label: &str) -> io::Result<String> {
    panic!("unexpected prompt: {label}")
  }

  #[test]
  fn configured_credentials_skip_prompts() {
    let ldap = settings(Some("svc@example.com"), Some("s3cret"));
    let creds = resolve(&ldap, never, never).unwrap();
    assert_eq!(creds, ("svc@example.com".into(), "s3cret".into()));
  }

  #[test]
  fn missing_password_goes_through_the_hidden_reader() {
    let ldap = settings(Some("svc@example.com"), None);
    let (_, password) =
      resolve(&ldap, never, |label| {
        assert!(label.contains("password"));
        Ok("typed".into())
      })
      .unwrap();
    assert_eq!(password, "typed");
  }

  #[test]
  fn missing_user_goes_through_the_line_reader() {
    let ldap = settings(None, Some("s3cret"));
    let (user, _) =
      resolve(&ldap, |_| Ok("me@example.com".into()), never).unwrap();
    assert_eq!(user, "me@example.com");
  }

  #[test]
  fn reader_errors_propagate() {
    let ldap = settings(None, None);
    let err = resolve(
      &ldap,
      |_| Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
      never,
    )
    .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
  }
}
