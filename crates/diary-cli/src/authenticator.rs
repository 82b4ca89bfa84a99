//! Terminal stand-in for a platform authenticator.
//!
//! User presence is an explicit confirmation at the terminal. Credential ids
//! are random and remembered per relying party in a small JSON file, so an
//! assertion is only produced for a credential this authenticator issued for
//! the same relying party.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use diary_core::biometric::{
    Assertion, AssertionOptions, AuthenticatorError, CreatedCredential, CredentialCreationOptions,
    PlatformAuthenticator, UserVerification,
};
use diary_core::fs::write_atomic;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CREDENTIAL_ID_LENGTH: usize = 16;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    credentials: Vec<StoredCredential>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredential {
    id: String,
    rp_id: Option<String>,
    user: String,
}

/// How the authenticator obtains user presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Prompt,
    #[cfg(feature = "test-support")]
    Approve,
    #[cfg(feature = "test-support")]
    Cancel,
}

pub struct TerminalAuthenticator {
    store_path: PathBuf,
    presence: Presence,
}

impl TerminalAuthenticator {
    pub fn new(store_path: PathBuf) -> Self {
        Self {
            store_path,
            presence: presence_from_env(),
        }
    }

    fn confirm(&self, prompt: &str) -> Result<(), AuthenticatorError> {
        match self.presence {
            Presence::Prompt => {
                let approved = dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .map_err(|e| AuthenticatorError::Rejected(e.to_string()))?;
                if approved {
                    Ok(())
                } else {
                    Err(AuthenticatorError::Cancelled)
                }
            }
            #[cfg(feature = "test-support")]
            Presence::Approve => Ok(()),
            #[cfg(feature = "test-support")]
            Presence::Cancel => Err(AuthenticatorError::Cancelled),
        }
    }
}

#[cfg(feature = "test-support")]
fn presence_from_env() -> Presence {
    match std::env::var("DIARY_TEST_AUTHENTICATOR").as_deref() {
        Ok("approve") => Presence::Approve,
        Ok("cancel") => Presence::Cancel,
        _ => Presence::Prompt,
    }
}

#[cfg(not(feature = "test-support"))]
fn presence_from_env() -> Presence {
    Presence::Prompt
}

impl PlatformAuthenticator for TerminalAuthenticator {
    fn is_supported(&self) -> bool {
        match self.presence {
            Presence::Prompt => std::io::stdin().is_terminal(),
            #[cfg(feature = "test-support")]
            _ => true,
        }
    }

    fn create_credential(
        &self,
        options: &CredentialCreationOptions,
    ) -> Result<CreatedCredential, AuthenticatorError> {
        if options.user_verification != UserVerification::Required {
            return Err(AuthenticatorError::Rejected(
                "user verification must be required".to_string(),
            ));
        }
        let rp = options
            .relying_party
            .id
            .as_deref()
            .unwrap_or(options.relying_party.name.as_str());
        self.confirm(&format!(
            "Register this terminal for biometric unlock of {} ({})?",
            options.relying_party.name, rp
        ))?;

        let mut raw_id = vec![0u8; CREDENTIAL_ID_LENGTH];
        getrandom::getrandom(&mut raw_id).map_err(|_| AuthenticatorError::NoAuthenticator)?;

        let mut file = read_credentials(&self.store_path)?;
        file.credentials.push(StoredCredential {
            id: STANDARD.encode(&raw_id),
            rp_id: options.relying_party.id.clone(),
            user: options.user.name.clone(),
        });
        write_credentials(&self.store_path, &file)?;
        debug!("terminal credential created");
        Ok(CreatedCredential { raw_id })
    }

    fn get_assertion(&self, options: &AssertionOptions) -> Result<Assertion, AuthenticatorError> {
        let file = read_credentials(&self.store_path)?;
        let known = options.allow_credentials.iter().find(|candidate| {
            let encoded = STANDARD.encode(candidate);
            file.credentials
                .iter()
                .any(|c| c.id == encoded && c.rp_id == options.relying_party_id)
        });
        let Some(credential_id) = known else {
            return Err(AuthenticatorError::Rejected(
                "no matching credential on this device".to_string(),
            ));
        };

        self.confirm("Confirm it's you to unlock the diary")?;
        Ok(Assertion {
            credential_id: credential_id.clone(),
            user_verified: true,
        })
    }
}

fn read_credentials(path: &Path) -> Result<CredentialFile, AuthenticatorError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|e| AuthenticatorError::Rejected(format!("credential store corrupt: {}", e))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(CredentialFile::default()),
        Err(err) => Err(AuthenticatorError::Rejected(err.to_string())),
    }
}

fn write_credentials(path: &Path, file: &CredentialFile) -> Result<(), AuthenticatorError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| AuthenticatorError::Rejected(e.to_string()))?;
    }
    let json = serde_json::to_vec_pretty(file)
        .map_err(|e| AuthenticatorError::Rejected(e.to_string()))?;
    write_atomic(path, &json).map_err(|e| AuthenticatorError::Rejected(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use diary_core::biometric::{
        AuthenticatorAttachment, RelyingParty, UserEntity, ALG_ES256, AUTHENTICATOR_TIMEOUT,
        CHALLENGE_LENGTH,
    };

    fn store_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("diary_authn_{}_{}", name, std::process::id()))
            .join("authenticator.json")
    }

    fn creation_options(rp_id: &str) -> CredentialCreationOptions {
        CredentialCreationOptions {
            challenge: [7u8; CHALLENGE_LENGTH],
            relying_party: RelyingParty {
                name: "Diary".to_string(),
                id: Some(rp_id.to_string()),
            },
            user: UserEntity {
                id: vec![1, 2, 3],
                name: "diary-user".to_string(),
                display_name: "Diary User".to_string(),
            },
            algorithms: vec![ALG_ES256],
            attachment: AuthenticatorAttachment::Platform,
            user_verification: UserVerification::Required,
            timeout: AUTHENTICATOR_TIMEOUT,
        }
    }

    fn assertion_options(rp_id: &str, id: Vec<u8>) -> AssertionOptions {
        AssertionOptions {
            challenge: [9u8; CHALLENGE_LENGTH],
            relying_party_id: Some(rp_id.to_string()),
            allow_credentials: vec![id],
            user_verification: UserVerification::Required,
            timeout: AUTHENTICATOR_TIMEOUT,
        }
    }

    #[test]
    fn test_unknown_credential_is_rejected_before_prompting() {
        let path = store_path("unknown");
        let authenticator = TerminalAuthenticator {
            store_path: path.clone(),
            presence: Presence::Prompt,
        };
        let result = authenticator.get_assertion(&assertion_options("diary.example.org", vec![1]));
        assert!(matches!(result, Err(AuthenticatorError::Rejected(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_credentials_round_trip_through_file() {
        let path = store_path("file");
        let file = CredentialFile {
            credentials: vec![StoredCredential {
                id: STANDARD.encode([4u8; CREDENTIAL_ID_LENGTH]),
                rp_id: Some("diary.example.org".to_string()),
                user: "diary-user".to_string(),
            }],
        };
        write_credentials(&path, &file).unwrap();
        let loaded = read_credentials(&path).unwrap();
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        assert_eq!(loaded.credentials.len(), 1);
        assert_eq!(loaded.credentials[0].rp_id.as_deref(), Some("diary.example.org"));
    }

    #[test]
    fn test_optional_verification_is_refused() {
        let authenticator = TerminalAuthenticator {
            store_path: store_path("uv"),
            presence: Presence::Prompt,
        };
        let mut options = creation_options("diary.example.org");
        options.user_verification = UserVerification::Preferred;
        assert!(matches!(
            authenticator.create_credential(&options),
            Err(AuthenticatorError::Rejected(_))
        ));
    }

    #[cfg(feature = "test-support")]
    #[test]
    fn test_scripted_presence_creates_and_asserts() {
        let path = store_path("scripted");
        let authenticator = TerminalAuthenticator {
            store_path: path.clone(),
            presence: Presence::Approve,
        };
        let created = authenticator
            .create_credential(&creation_options("diary.example.org"))
            .unwrap();
        assert_eq!(created.raw_id.len(), CREDENTIAL_ID_LENGTH);

        let assertion = authenticator
            .get_assertion(&assertion_options("diary.example.org", created.raw_id.clone()))
            .unwrap();
        assert_eq!(assertion.credential_id, created.raw_id);

        let other_rp =
            authenticator.get_assertion(&assertion_options("other.example.org", created.raw_id));
        assert!(matches!(other_rp, Err(AuthenticatorError::Rejected(_))));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
