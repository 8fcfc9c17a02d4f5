use rotonda_fib::errors::FibError;
use rotonda_fib::fib::config::{
    DxrConfig, SailConfig, DEFAULT_CHUNK_BITS, MAX_CHUNK_BITS,
};
use rotonda_fib::fib::{Config, Fib};
use rotonda_fib::{Dxr, Sail};

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

#[test]
fn configs_from_json() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    let config: DxrConfig = serde_json::from_str(r#"{"chunk_bits": 20}"#)?;
    assert_eq!(config.chunk_bits, 20);
    assert_eq!(config.memory_limit(), None);

    let config: DxrConfig = serde_json::from_str("{}")?;
    assert_eq!(config, DxrConfig::default());
    assert_eq!(config.chunk_bits, DEFAULT_CHUNK_BITS);

    let config: SailConfig =
        serde_json::from_str(r#"{"memory_limit": 1073741824}"#)?;
    assert_eq!(config.memory_limit(), Some(1 << 30));

    let json = serde_json::to_string(&DxrConfig::default())?;
    assert_eq!(json, r#"{"chunk_bits":18,"memory_limit":null}"#);
    Ok(())
}

#[test]
fn invalid_config_is_refused() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    let config: DxrConfig = serde_json::from_str(r#"{"chunk_bits": 8}"#)?;
    assert_eq!(config.validate(), Err(FibError::ConfigInvalid));
    assert!(matches!(
        Fib::<Dxr>::new_with_config(config),
        Err(FibError::ConfigInvalid)
    ));

    let config = DxrConfig::default().with_chunk_bits(MAX_CHUNK_BITS + 1);
    assert!(matches!(
        Fib::<Dxr>::new_with_config(config),
        Err(FibError::ConfigInvalid)
    ));

    assert!(Fib::<Dxr>::new_with_config(
        DxrConfig::default().with_chunk_bits(MAX_CHUNK_BITS)
    )
    .is_ok());
    assert!(Fib::<Sail>::new_with_config(SailConfig::default()).is_ok());
    Ok(())
}
