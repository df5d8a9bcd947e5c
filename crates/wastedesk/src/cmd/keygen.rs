//! Keygen command - Write a P-256 key pair for ES256 tokens
//!
//! ```bash
//! wastedesk keygen --out internal/assets/dev/jwt
//! wastedesk keygen --out keys --force
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use wastedesk_auth::write_p256_keypair;

/// Keygen command arguments
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Directory for privkey.pem and pubkey.pem
    #[arg(short, long, default_value = "internal/assets/dev/jwt")]
    pub out: PathBuf,

    /// Overwrite existing key files
    #[arg(short, long)]
    pub force: bool,
}

/// Run the keygen command
pub fn run(args: KeygenArgs) -> Result<()> {
    let (private_path, public_path) =
        write_p256_keypair(&args.out, args.force).context("failed to write key pair")?;

    println!("private key: {}", private_path.display());
    println!("public key:  {}", public_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let args = || KeygenArgs {
            out: dir.path().to_path_buf(),
            force: false,
        };

        run(args()).unwrap();
        assert!(dir.path().join("privkey.pem").exists());
        assert!(run(args()).is_err());

        run(KeygenArgs {
            out: dir.path().to_path_buf(),
            force: true,
        })
        .unwrap();
    }
}
