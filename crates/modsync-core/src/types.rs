pub use modsync_schema::{
    ApiErrorBody, FileHashes, FileRef, LoaderName, PACKAGE_EXTENSION, RemoteDetails, Sha1Hash,
    Sha1HashError, UpdateCandidate,
};
