use anonflux_core::envelope::{decrypt, encrypt, generate_key, DecryptionError, NONCE_LEN};

#[test]
fn round_trips_empty_small_and_large_payloads() {
    let key = generate_key();
    let large: Vec<u8> = (0..5 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

    for plaintext in [Vec::new(), b"parquet bytes".to_vec(), large] {
        let token = encrypt(&plaintext, &key).expect("encrypt failed");
        let recovered = decrypt(&token, &key).expect("decrypt failed");
        assert_eq!(recovered, plaintext);
    }
}

#[test]
fn wrong_key_is_rejected() {
    let key = generate_key();
    let other = generate_key();
    assert_ne!(key.as_bytes(), other.as_bytes());

    let token = encrypt(b"users", &key).unwrap();

    assert_eq!(decrypt(&token, &other), Err(DecryptionError::Authentication));
}

#[test]
fn every_single_bit_flip_is_rejected() {
    let key = generate_key();
    let token = encrypt(b"anonymized user table", &key).unwrap();

    for byte in 0..token.len() {
        for bit in 0..8 {
            let mut tampered = token.clone();
            tampered[byte] ^= 1 << bit;
            assert!(
                decrypt(&tampered, &key).is_err(),
                "flip of bit {bit} in byte {byte} was accepted"
            );
        }
    }
}

#[test]
fn truncated_tokens_are_rejected() {
    let key = generate_key();
    let token = encrypt(b"users", &key).unwrap();

    assert!(matches!(
        decrypt(&token[..NONCE_LEN], &key),
        Err(DecryptionError::Truncated { .. })
    ));
    assert!(decrypt(&token[..token.len() - 1], &key).is_err());
    assert!(decrypt(&[], &key).is_err());
}

#[test]
fn identical_plaintexts_produce_unlinkable_tokens() {
    let key = generate_key();

    let first = encrypt(b"same payload", &key).unwrap();
    let second = encrypt(b"same payload", &key).unwrap();

    assert_ne!(first, second);
    assert_ne!(first[1..1 + NONCE_LEN], second[1..1 + NONCE_LEN]);
}
