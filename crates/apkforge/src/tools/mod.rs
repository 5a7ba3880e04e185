//! The managed toolchain: a Java runtime plus the jars and blobs the
//! pipeline shells out to. Each tool provisions itself on first use.

mod android_jar;
mod apksigner;
mod apktool;
mod java;

pub use android_jar::AndroidJar;
pub use apksigner::ApkSigner;
pub use apktool::ApkTool;
pub use java::Java;
