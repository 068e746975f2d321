// std
use std::sync::Arc;
// crates
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use url::Url;
// internal
use tessera_core::{ExtendedHeader, Getter, GetterError, NamespacedShares};
use tessera_nmt::Namespace;
use tessera_square::{ExtendedDataSquare, Share};

/// Archive route serving every share of a namespace at a height.
const GET_SHARES_BY_NAMESPACE: &str = "/celestia/GetSharesByNamespace";
/// Trust-endpoint route serving the archived commitment for a height.
const GET_TRUSTED_HEADER: &str = "/header";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveGetterSettings {
    /// The bulk archive answering namespace queries.
    pub archive_url: Url,
    /// An independent endpoint serving the commitment the archive cannot
    /// forge; the two are distinct services on purpose.
    pub trust_url: Url,
}

/// Trustless historical-archive backend. Answers namespace queries only;
/// everything the archive returns is proven against the caller's header
/// before a byte of it escapes.
#[derive(Clone)]
pub struct ArchiveGetter {
    client: Arc<Client>,
    settings: ArchiveGetterSettings,
}

/// Wire envelope: the opaque archived payload plus the proof bundle
/// covering it. The payload stays raw until the proof has been checked.
#[derive(Deserialize)]
struct ArchiveEnvelope {
    data: Box<RawValue>,
    proof: ArchiveProof,
}

#[derive(Deserialize)]
struct ArchiveProof {
    rows: Vec<tessera_core::NamespacedRow>,
}

#[derive(Deserialize)]
struct ArchivePayload {
    #[serde(rename = "Data")]
    data: Vec<Share>,
}

#[derive(Deserialize)]
struct TrustedCommitment {
    dah_hash: String,
}

impl ArchiveGetter {
    pub fn new(settings: ArchiveGetterSettings) -> Self {
        let client = ClientBuilder::new()
            .build()
            .expect("Client from default settings should be able to build");
        Self {
            client: Arc::new(client),
            settings,
        }
    }

    fn route(base: &Url, route: &str) -> Result<Url, GetterError> {
        // `Url::join` treats a base path without a trailing slash as a file
        // and would drop its last segment
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(route.trim_start_matches('/'))
            .map_err(GetterError::transport)
    }

    /// Run a request, surfacing a non-OK status before the body is parsed.
    async fn execute_request(&self, request: RequestBuilder) -> Result<String, GetterError> {
        let response = request.send().await.map_err(GetterError::transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            // drain the body so the connection is released cleanly
            let _ = response.text().await;
            return Err(GetterError::Transport(format!(
                "unexpected status {status}"
            )));
        }
        response.text().await.map_err(GetterError::transport)
    }

    /// The archive itself is untrusted; its commitment for this height must
    /// match the header the caller already trusts.
    async fn check_trusted_commitment(&self, header: &ExtendedHeader) -> Result<(), GetterError> {
        let url = Self::route(&self.settings.trust_url, GET_TRUSTED_HEADER)?;
        let request = self
            .client
            .get(url)
            .query(&[("height", header.height().to_string())]);
        let body = self.execute_request(request).await?;
        let commitment: TrustedCommitment =
            serde_json::from_str(&body).map_err(GetterError::serialization)?;
        let archived = BASE64_STANDARD
            .decode(&commitment.dah_hash)
            .map_err(GetterError::serialization)?;
        if archived != header.dah().hash() {
            return Err(GetterError::verification(
                "archived commitment does not match the trusted header",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Getter for ArchiveGetter {
    async fn get_share(
        &self,
        _header: &ExtendedHeader,
        _row: usize,
        _col: usize,
    ) -> Result<Share, GetterError> {
        // the archive indexes by namespace only
        Err(GetterError::UnsupportedOperation("get_share"))
    }

    async fn get_eds(&self, _header: &ExtendedHeader) -> Result<ExtendedDataSquare, GetterError> {
        Err(GetterError::UnsupportedOperation("get_eds"))
    }

    async fn get_shares_by_namespace(
        &self,
        header: &ExtendedHeader,
        namespace: Namespace,
    ) -> Result<NamespacedShares, GetterError> {
        tracing::debug!(
            height = header.height(),
            %namespace,
            "querying archive for namespace shares"
        );
        self.check_trusted_commitment(header).await?;

        let url = Self::route(&self.settings.archive_url, GET_SHARES_BY_NAMESPACE)?;
        let request = self.client.get(url).query(&[
            ("height", header.height().to_string()),
            ("namespace", BASE64_STANDARD.encode(namespace.as_bytes())),
        ]);
        let body = self.execute_request(request).await?;
        let envelope: ArchiveEnvelope =
            serde_json::from_str(&body).map_err(GetterError::serialization)?;

        // prove the rows against the caller's header, never against
        // anything the archive sent
        let result = NamespacedShares {
            rows: envelope.proof.rows,
        };
        result.verify(header.dah(), namespace)?;

        // only now is the opaque payload worth parsing, and it must agree
        // with the shares the proof covers
        let payload: ArchivePayload =
            serde_json::from_str(envelope.data.get()).map_err(GetterError::serialization)?;
        if payload.data != result.shares() {
            return Err(GetterError::verification(
                "archive payload disagrees with its proof",
            ));
        }
        Ok(result)
    }
}
