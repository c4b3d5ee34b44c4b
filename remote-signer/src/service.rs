//! Request validation and dispatch against a keyvault.
//!
//! The service keeps no state between calls. The keyvault it reads is
//! frozen after startup, so calls from many connections run without locks.

use std::sync::Arc;

use eth2_signer_bls::{BlsPubKey, PUBLIC_KEY_LENGTH};
use eth2_signer_keyvault::KeyStore;
use tracing::{debug, warn};

use crate::protocol::{ListPublicKeysResponse, Request, Response, SignRequest, SignResponse, Status};

/// Signs requests with secret keys looked up in a keyvault.
#[derive(Clone)]
pub struct SigningService {
    keyvault: Arc<dyn KeyStore>,
}

impl SigningService {
    pub fn new(keyvault: Arc<dyn KeyStore>) -> Self {
        Self { keyvault }
    }

    /// Sign `req.signing_root` with the key selected by `req.public_key`.
    ///
    /// Malformed keys fail with `InvalidArgument` before the keyvault is
    /// consulted. Any keyvault failure, including an unknown key, is
    /// reported as `Internal`.
    pub fn sign(&self, req: &SignRequest) -> Result<SignResponse, Status> {
        if req.public_key.is_empty() {
            return Err(Status::invalid_argument("Expected public key in request"));
        }
        if req.public_key.len() != PUBLIC_KEY_LENGTH {
            return Err(Status::invalid_argument(format!(
                "Wrong public key byte size: {}, expected {}",
                req.public_key.len(),
                PUBLIC_KEY_LENGTH
            )));
        }
        let pubkey = BlsPubKey::from_bytes(&req.public_key).map_err(|e| {
            Status::invalid_argument(format!("Could not parse public key: {}", e))
        })?;

        let secret_key = self.keyvault.get_secret_key(&pubkey).map_err(|e| {
            Status::internal(format!("Could not fetch secret key from vault: {}", e))
        })?;

        // No slashing protection: conflicting roots are signed too and
        // `SignStatus::Denied` is never returned.
        let signature = secret_key.sign(&req.signing_root);
        debug!(
            pubkey = %pubkey,
            root = %hex::encode(&req.signing_root),
            "Signed request"
        );

        Ok(SignResponse::succeeded(signature.serialize()))
    }

    /// Compressed public keys available for signing, in keyvault order.
    pub fn list_validating_public_keys(&self) -> Result<ListPublicKeysResponse, Status> {
        let pubkeys = self
            .keyvault
            .get_public_keys()
            .map_err(|e| Status::internal(format!("Could not retrieve public keys: {}", e)))?;

        Ok(ListPublicKeysResponse {
            validating_public_keys: pubkeys.iter().map(|pk| pk.compress().to_vec()).collect(),
        })
    }

    /// Dispatch a decoded request and build its wire response.
    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Sign(req) => match self.sign(&req) {
                Ok(response) => Response::Sign {
                    response,
                    error: None,
                },
                Err(status) => {
                    warn!("Sign request failed: {}", status);
                    Response::Sign {
                        response: SignResponse::failed(),
                        error: Some(status),
                    }
                }
            },
            Request::ListValidatingPublicKeys => match self.list_validating_public_keys() {
                Ok(list) => Response::PublicKeys(list),
                Err(status) => {
                    warn!("Listing public keys failed: {}", status);
                    Response::Error(status)
                }
            },
            Request::Ping => Response::Pong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Code, SignStatus};
    use eth2_signer_bls::{BlsKeyPair, BlsSecretKey, BlsSignature};
    use eth2_signer_keyvault::{DeterministicKeyStore, KeyVaultError};
    use rand::RngCore;

    /// Keyvault that signs with one random key for every public key, or
    /// fails every call.
    struct MockKeyVault {
        pubkeys: Vec<BlsPubKey>,
        secret: BlsSecretKey,
        want_err: bool,
    }

    impl MockKeyVault {
        fn new(pubkeys: Vec<BlsPubKey>, want_err: bool) -> Self {
            Self {
                pubkeys,
                secret: random_keypair().secret().clone(),
                want_err,
            }
        }
    }

    impl KeyStore for MockKeyVault {
        fn get_secret_key(&self, _pubkey: &BlsPubKey) -> Result<&BlsSecretKey, KeyVaultError> {
            if self.want_err {
                return Err(KeyVaultError::Unavailable("failed".to_string()));
            }
            Ok(&self.secret)
        }

        fn get_public_keys(&self) -> Result<&[BlsPubKey], KeyVaultError> {
            if self.want_err {
                return Err(KeyVaultError::Unavailable("failed".to_string()));
            }
            Ok(&self.pubkeys)
        }
    }

    fn random_keypair() -> BlsKeyPair {
        let mut ikm = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut ikm);
        BlsKeyPair::from_secret(BlsSecretKey::key_gen(&ikm).unwrap())
    }

    fn mock_service(want_err: bool) -> SigningService {
        SigningService::new(Arc::new(MockKeyVault::new(Vec::new(), want_err)))
    }

    fn deterministic_service(num_keys: u64) -> SigningService {
        SigningService::new(Arc::new(DeterministicKeyStore::new(num_keys).unwrap()))
    }

    fn bad_pubkey() -> Vec<u8> {
        let mut key = vec![0u8; PUBLIC_KEY_LENGTH];
        key[..11].copy_from_slice(b"hello-world");
        key
    }

    #[test]
    fn test_sign_fails_table() {
        let cases: Vec<(&str, SigningService, Vec<u8>, Code, &str)> = vec![
            (
                "missing public key",
                mock_service(false),
                Vec::new(),
                Code::InvalidArgument,
                "Expected public key in request",
            ),
            (
                "public key of wrong size",
                mock_service(false),
                vec![0u8; PUBLIC_KEY_LENGTH - 1],
                Code::InvalidArgument,
                "Wrong public key byte size: 47, expected 48",
            ),
            (
                "unparseable public key",
                mock_service(false),
                bad_pubkey(),
                Code::InvalidArgument,
                "Could not parse public key",
            ),
            (
                "vault retrieval fails",
                mock_service(true),
                random_keypair().pubkey().compress().to_vec(),
                Code::Internal,
                "Could not fetch secret key from vault",
            ),
        ];

        for (name, service, public_key, code, message) in cases {
            let req = SignRequest {
                public_key,
                signing_root: vec![0u8; 32],
            };
            let status = service.sign(&req).unwrap_err();
            assert_eq!(status.code, code, "{}", name);
            assert!(status.message.contains(message), "{}: {}", name, status);

            match service.handle(Request::Sign(req)) {
                Response::Sign { response, error } => {
                    assert_eq!(response.status, SignStatus::Failed, "{}", name);
                    assert_eq!(error, Some(status), "{}", name);
                }
                other => panic!("{}: expected Sign response, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_missing_key_checked_before_length() {
        // A wrong-length check on an empty key would also fail; the missing
        // key message must win.
        let status = mock_service(true).sign(&SignRequest::default()).unwrap_err();
        assert_eq!(status.message, "Expected public key in request");
    }

    #[test]
    fn test_wrong_length_never_parsed() {
        // 47 bytes of a valid key would parse if the length check were skipped.
        let mut key = random_keypair().pubkey().compress().to_vec();
        key.pop();

        let status = mock_service(false)
            .sign(&SignRequest {
                public_key: key,
                signing_root: vec![0u8; 32],
            })
            .unwrap_err();
        assert_eq!(status.code, Code::InvalidArgument);
        assert!(status.message.starts_with("Wrong public key byte size"));
    }

    #[test]
    fn test_unknown_key_is_internal() {
        let service = deterministic_service(1);
        let outsider = random_keypair().pubkey();

        let status = service
            .sign(&SignRequest {
                public_key: outsider.compress().to_vec(),
                signing_root: vec![1u8; 32],
            })
            .unwrap_err();
        assert_eq!(status.code, Code::Internal);
    }

    #[test]
    fn test_sign_succeeds_with_mock() {
        let service = mock_service(false);
        let resp = service
            .sign(&SignRequest {
                public_key: random_keypair().pubkey().compress().to_vec(),
                signing_root: vec![0u8; 32],
            })
            .unwrap();

        assert_eq!(resp.status, SignStatus::Succeeded);
        assert_eq!(resp.signature.len(), 96);
    }

    #[test]
    fn test_single_key_list_and_sign() {
        let service = deterministic_service(1);

        let list = service.list_validating_public_keys().unwrap();
        assert_eq!(list.validating_public_keys.len(), 1);
        let key = list.validating_public_keys[0].clone();
        assert_eq!(key.len(), PUBLIC_KEY_LENGTH);

        let root = vec![0u8; 32];
        let resp = service
            .sign(&SignRequest {
                public_key: key.clone(),
                signing_root: root.clone(),
            })
            .unwrap();
        assert_eq!(resp.status, SignStatus::Succeeded);
        assert_eq!(resp.signature.len(), 96);

        let sig = BlsSignature::deserialize(&resp.signature).unwrap();
        let pubkey = BlsPubKey::from_bytes(&key).unwrap();
        assert!(sig.verify(&root, &pubkey).is_ok());
    }

    #[test]
    fn test_every_store_key_signs_verifiably() {
        let service = deterministic_service(4);
        let root = [7u8; 32];

        for key in service.list_validating_public_keys().unwrap().validating_public_keys {
            let resp = service
                .sign(&SignRequest {
                    public_key: key.clone(),
                    signing_root: root.to_vec(),
                })
                .unwrap();
            let sig = BlsSignature::deserialize(&resp.signature).unwrap();
            assert!(sig.verify(&root, &BlsPubKey::from_bytes(&key).unwrap()).is_ok());
        }
    }

    #[test]
    fn test_list_fails_when_vault_fails() {
        let status = mock_service(true)
            .list_validating_public_keys()
            .unwrap_err();

        assert_eq!(status.code, Code::Internal);
        assert!(status.message.contains("Could not retrieve public keys"));
        assert!(matches!(
            mock_service(true).handle(Request::ListValidatingPublicKeys),
            Response::Error(_)
        ));
    }

    #[test]
    fn test_list_preserves_order() {
        let keys: Vec<BlsPubKey> = (0..10).map(|_| random_keypair().pubkey()).collect();
        let service = SigningService::new(Arc::new(MockKeyVault::new(keys.clone(), false)));

        let list = service.list_validating_public_keys().unwrap();
        assert_eq!(list.validating_public_keys.len(), keys.len());
        for (wanted, received) in keys.iter().zip(&list.validating_public_keys) {
            assert_eq!(wanted.compress().to_vec(), *received);
        }
    }

    #[test]
    fn test_handle_ping() {
        assert_eq!(mock_service(false).handle(Request::Ping), Response::Pong);
    }
}
