use crate::domain::payment::{ApiKey, PaymentProvider, VendorPaymentSetting};
use crate::domain::ports::PaymentSettingStoreRef;
use crate::error::{CheckoutError, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// AES-GCM nonces are 96 bits.
const NONCE_LEN: usize = 12;

/// The process-wide symmetric key the vault encrypts under.
#[derive(Clone)]
pub struct MasterKey([u8; 32]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives a 256-bit key from an operator passphrase via SHA-256.
    pub fn derive(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        Self(digest.into())
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(REDACTED)")
    }
}

/// Encrypts and decrypts vendor payment credentials at rest.
///
/// Ciphertext layout is `nonce || ciphertext` with a fresh random nonce per
/// encryption, so encrypting the same plaintext twice yields different
/// bytes. Plaintext only ever exists inside this type's methods; callers get
/// an [`ApiKey`] whose Debug/Display output is redacted.
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
    settings: PaymentSettingStoreRef,
}

impl CredentialVault {
    pub fn new(key: &MasterKey, settings: PaymentSettingStoreRef) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
        Self { cipher, settings }
    }

    /// Encrypts `plaintext` and persists it as the shop's active credential
    /// for `provider`, deactivating any previous active row for the pair.
    pub async fn store(
        &self,
        shop_id: Uuid,
        provider: PaymentProvider,
        plaintext: &str,
    ) -> Result<VendorPaymentSetting> {
        let ciphertext = self.encrypt(plaintext.as_bytes())?;

        for mut existing in self.settings.for_shop(shop_id).await? {
            if existing.provider == provider && existing.is_active {
                existing.is_active = false;
                self.settings.put(existing).await?;
            }
        }

        let setting = VendorPaymentSetting::new(shop_id, provider, ciphertext);
        self.settings.put(setting.clone()).await?;
        tracing::info!(%shop_id, %provider, "payment credential stored");
        Ok(setting)
    }

    /// Decrypts the shop's active credential for `provider`.
    pub async fn resolve(&self, shop_id: Uuid, provider: PaymentProvider) -> Result<ApiKey> {
        let setting = self
            .settings
            .for_shop(shop_id)
            .await?
            .into_iter()
            .find(|s| s.is_active && s.provider == provider)
            .ok_or(CheckoutError::PaymentNotConfigured)?;

        self.open(&setting)
    }

    /// Resolves "the" active credential for a shop: the most recently
    /// configured active row, whichever provider it names.
    pub async fn resolve_active(&self, shop_id: Uuid) -> Result<(PaymentProvider, ApiKey)> {
        let setting = self
            .settings
            .for_shop(shop_id)
            .await?
            .into_iter()
            .find(|s| s.is_active)
            .ok_or(CheckoutError::PaymentNotConfigured)?;

        let key = self.open(&setting)?;
        Ok((setting.provider, key))
    }

    fn open(&self, setting: &VendorPaymentSetting) -> Result<ApiKey> {
        let plaintext = self.decrypt(&setting.api_key_ciphertext)?;
        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| CheckoutError::Crypto("credential is not valid UTF-8".to_string()))?;
        Ok(ApiKey::new(plaintext))
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|e| CheckoutError::Crypto(format!("encryption failed: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() <= NONCE_LEN {
            return Err(CheckoutError::Crypto(
                "ciphertext shorter than nonce".to_string(),
            ));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::clone_from_slice(nonce_bytes);

        self.cipher
            .decrypt(&nonce, ciphertext)
            .map_err(|e| CheckoutError::Crypto(format!("decryption failed: {e}")))
    }
}
