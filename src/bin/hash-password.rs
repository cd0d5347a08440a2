//! Generates a bcrypt hash for the bootstrap admin account.
//!
//! Usage: cargo run --bin hash-password -- <PASSWORD>

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let password = match env::args().nth(1) {
        Some(p) => p,
        None => {
            eprintln!("Usage: cargo run --bin hash-password -- <PASSWORD>");
            std::process::exit(1);
        }
    };

    match hash(&password, DEFAULT_COST) {
        Ok(hashed) => {
            println!("# Add these to your .env, then restart the server to seed the admin:");
            println!("ADMIN_EMAIL=admin@example.com");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
