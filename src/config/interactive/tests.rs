use super::load_existing_config as load_existing_config_impl;
use crate::config::settings::HOME_ENV_VAR;
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn load_existing_config() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    // SAFETY: serialized with other environment-mutating tests
    unsafe {
        std::env::set_var(HOME_ENV_VAR, temp_dir.path());
    }

    let config = load_existing_config_impl().expect("config loaded successfully");
    assert!(!config.provider.host.is_empty());
    assert!(config.provider.port > 0);
    assert!(!config.provider.model.is_empty());
    assert!(config.provider.batch_size > 0);
    assert_eq!(config.get_base_dir(), temp_dir.path());

    unsafe {
        std::env::remove_var(HOME_ENV_VAR);
    }
}
