//! Database client
//!
//! The typed API over a [`CommClient`]. Every call checks the reply's error
//! condition and surfaces it as the matching
//! [`QuillError`](crate::error::QuillError).

use std::slice;
use std::sync::Arc;

use crate::codec::{CodecRegistry, ContentsPipe};
use crate::document::{Document, DocumentContents};
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{DeleteRequestBody, Request, RequestBody};

use super::{ClientSettings, CommClient, DirectCommClient};

/// The database client interface
pub struct DbClient {
    pipe: Arc<ContentsPipe>,
    registry: CodecRegistry,
    comm: Box<dyn CommClient>,
}

impl DbClient {
    /// Create a client writing with `settings` and sending through `comm`
    pub fn new(settings: &ClientSettings, comm: impl CommClient + 'static) -> Result<Self> {
        let mut registry = CodecRegistry::new();
        let pipe = registry.register(settings.contents_pipe()?);

        Ok(Self {
            pipe,
            registry,
            comm: Box::new(comm),
        })
    }

    /// A client with default settings calling `engine` in-process
    pub fn direct(engine: Arc<Engine>) -> Result<Self> {
        Self::new(&ClientSettings::default(), DirectCommClient::new(engine))
    }

    /// Register another pipe so documents written with it can be read
    pub fn register_pipe(&mut self, pipe: ContentsPipe) {
        self.registry.register(pipe);
    }

    /// The pipe new documents are written with
    pub fn pipe(&self) -> &ContentsPipe {
        &self.pipe
    }

    // =========================================================================
    // Documents
    // =========================================================================

    /// A new document at version 0
    pub fn create_document<T: DocumentContents>(
        &self,
        key: impl Into<Vec<u8>>,
        payload: &T,
    ) -> Result<Document> {
        Document::create(key, payload, &self.pipe)
    }

    /// The next version of `document` with new contents
    pub fn update_document<T: DocumentContents>(
        &self,
        document: &Document,
        payload: &T,
    ) -> Result<Document> {
        let pipe = self.registry.resolve(document.content_type())?;
        document.with_contents(payload, &pipe)
    }

    /// Decode a document's contents
    pub fn contents_of<T: DocumentContents>(&self, document: &Document) -> Result<T> {
        document.contents_as(&self.registry)
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Write one document as an optimistically locked upsert
    pub fn write(&self, document: &Document) -> Result<()> {
        self.write_all(slice::from_ref(document))
    }

    /// Write several documents; either all are accepted or none are
    pub fn write_all(&self, documents: &[Document]) -> Result<()> {
        self.send_mutation(Request::write(documents.to_vec()))
    }

    /// The document stored under `key`, if any
    pub fn get(&self, key: &[u8]) -> Result<Option<Document>> {
        Ok(self.get_all(&[key.to_vec()])?.into_iter().next())
    }

    /// Documents for the keys that exist, in request order
    pub fn get_all(&self, keys: &[Vec<u8>]) -> Result<Vec<Document>> {
        self.send_query(Request::get(keys.to_vec()))
    }

    /// Documents with `start <= key < end` in key order (empty end = unbounded)
    pub fn get_range(&self, start: &[u8], end: &[u8]) -> Result<Vec<Document>> {
        self.send_query(Request::get_range(start, end))
    }

    /// Delete a document if it exists
    pub fn delete(&self, document: &Document) -> Result<()> {
        self.delete_all(slice::from_ref(document))
    }

    /// Delete every given document that exists; the rest are ignored
    pub fn delete_all(&self, documents: &[Document]) -> Result<()> {
        let body = DeleteRequestBody::from_documents(documents);
        self.send_mutation(Request::new(RequestBody::Delete(body)))
    }

    /// Delete by key
    pub fn delete_keys(&self, keys: Vec<Vec<u8>>) -> Result<()> {
        self.send_mutation(Request::delete(keys))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn send_mutation(&self, request: Request) -> Result<()> {
        let reply = self.comm.send(request)?;
        reply.error_condition().clone().into_result()?;
        reply.into_write().map(|_| ())
    }

    fn send_query(&self, request: Request) -> Result<Vec<Document>> {
        let reply = self.comm.send(request)?;
        reply.error_condition().clone().into_result()?;

        reply
            .into_get()?
            .document_bytes
            .iter()
            .map(|bytes| Document::from_bytes(bytes))
            .collect()
    }
}
