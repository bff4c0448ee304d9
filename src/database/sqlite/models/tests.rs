use chrono::Utc;

use super::*;

#[test]
fn ledger_currency_check() {
    let entry = EmbeddingLedgerEntry {
        artisan_id: "a".to_string(),
        content_hash: "h1".to_string(),
        model_version: "ollama:nomic:fusion-v1".to_string(),
        confidence: 0.7,
        dimensions: 768,
        generated_at: Utc::now(),
    };

    assert!(entry.is_current("h1", "ollama:nomic:fusion-v1"));
    assert!(!entry.is_current("h2", "ollama:nomic:fusion-v1"));
    assert!(!entry.is_current("h1", "local:hash:fusion-v1"));
}

#[test]
fn record_profile_decoding() {
    let profile = ArtisanProfile::new("a-1", "Ines");
    let record = ArtisanRecord {
        id: profile.id.clone(),
        name: profile.name.clone(),
        profile_json: serde_json::to_string(&profile).expect("should serialize profile"),
        content_hash: profile.content_hash(),
        imported_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(record.profile().expect("should decode profile"), profile);

    let broken = ArtisanRecord {
        profile_json: "{not json".to_string(),
        ..record
    };
    assert!(broken.profile().is_err());
}
