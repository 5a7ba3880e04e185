//! Streamed file digests used for artifact validation.

use std::path::Path;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::Result;

const CHUNK: usize = 64 * 1024;

async fn digest_file<D: Digest>(path: &Path, mut hasher: D) -> Result<Vec<u8>> {
    let mut file = File::open(path).await?;
    let mut buf = vec![0u8; CHUNK];
    loop {
        let read = file.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hasher.finalize().to_vec())
}

pub async fn file_sha256(path: &Path) -> Result<Vec<u8>> {
    digest_file(path, Sha256::new()).await
}

pub async fn file_md5(path: &Path) -> Result<Vec<u8>> {
    digest_file(path, Md5::new()).await
}

/// Git blob identity: SHA-1 over `"blob {len}\0"` followed by the file
/// contents. This is what Gitiles reports as a file's `id`.
pub async fn git_blob_sha1(path: &Path) -> Result<Vec<u8>> {
    let len = tokio::fs::metadata(path).await?.len();
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {len}\0").as_bytes());
    digest_file(path, hasher).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_temp(contents: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blob");
        tokio::fs::write(&path, contents).await.expect("write");
        (dir, path)
    }

    #[tokio::test]
    async fn sha256_of_known_input() {
        let (_dir, path) = write_temp(b"abc").await;
        let digest = file_sha256(&path).await.expect("digest");
        assert_eq!(
            hex::encode(digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn md5_of_known_input() {
        let (_dir, path) = write_temp(b"abc").await;
        let digest = file_md5(&path).await.expect("digest");
        assert_eq!(hex::encode(digest), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[tokio::test]
    async fn git_blob_matches_git_hash_object() {
        // echo -n 'hello' | git hash-object --stdin
        let (_dir, path) = write_temp(b"hello").await;
        let digest = git_blob_sha1(&path).await.expect("digest");
        assert_eq!(
            hex::encode(digest),
            "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0"
        );
    }
}
