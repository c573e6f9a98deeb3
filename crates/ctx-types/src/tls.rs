use std::collections::BTreeMap;

/// Endpoint name → file names present for that endpoint.
pub type EndpointFiles = BTreeMap<String, Vec<String>>;

/// TLS files of one endpoint of one context: file name → raw bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EndpointTlsData {
    pub files: BTreeMap<String, Vec<u8>>,
}

impl EndpointTlsData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add one file.
    pub fn with_file(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    /// Add or replace one file.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.files.insert(name.into(), data.into());
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    /// Sorted file names.
    pub fn file_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// All TLS material of one context: endpoint name → files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContextTlsData {
    pub endpoints: BTreeMap<String, EndpointTlsData>,
}

impl ContextTlsData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the files of one endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>, data: EndpointTlsData) -> Self {
        self.endpoints.insert(endpoint.into(), data);
        self
    }

    pub fn endpoint(&self, endpoint: &str) -> Option<&EndpointTlsData> {
        self.endpoints.get(endpoint)
    }

    /// Mutable access to an endpoint's files, creating an empty entry if needed.
    pub fn endpoint_mut(&mut self, endpoint: &str) -> &mut EndpointTlsData {
        self.endpoints.entry(endpoint.to_string()).or_default()
    }

    /// Look up one file.
    pub fn file(&self, endpoint: &str, file: &str) -> Option<&[u8]> {
        self.endpoint(endpoint)?.get(file)
    }

    /// File names per endpoint, without content.
    pub fn file_names(&self) -> EndpointFiles {
        self.endpoints
            .iter()
            .map(|(endpoint, data)| (endpoint.clone(), data.file_names()))
            .collect()
    }

    /// Returns `true` if no endpoint holds any file.
    pub fn is_empty(&self) -> bool {
        self.endpoints.values().all(EndpointTlsData::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_lookup_through_context() {
        let tls = ContextTlsData::new().with_endpoint(
            "docker",
            EndpointTlsData::new()
                .with_file("ca.pem", b"CA".to_vec())
                .with_file("key.pem", b"KEY".to_vec()),
        );
        assert_eq!(tls.file("docker", "ca.pem"), Some(&b"CA"[..]));
        assert_eq!(tls.file("docker", "cert.pem"), None);
        assert_eq!(tls.file("k8s", "ca.pem"), None);
    }

    #[test]
    fn file_names_are_sorted_per_endpoint() {
        let mut tls = ContextTlsData::new();
        tls.endpoint_mut("docker").insert("key.pem", b"k".to_vec());
        tls.endpoint_mut("docker").insert("ca.pem", b"c".to_vec());
        let names = tls.file_names();
        assert_eq!(names["docker"], vec!["ca.pem", "key.pem"]);
    }

    #[test]
    fn empty_endpoints_count_as_empty() {
        let tls = ContextTlsData::new().with_endpoint("docker", EndpointTlsData::new());
        assert!(tls.is_empty());
    }
}
