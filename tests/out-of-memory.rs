use rotonda_fib::errors::FibError;
use rotonda_fib::fib::config::{DxrConfig, SailConfig};
use rotonda_fib::fib::{Config, Fib};
use rotonda_fib::{Dxr, NextHop, Sail};

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

const A: NextHop = NextHop::new(1);
const B: NextHop = NextHop::new(2);

#[test]
fn dxr_keeps_previous_table() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    // A /16 chunk table is 64Ki chunks of 8 bytes.
    let config = DxrConfig::default()
        .with_chunk_bits(16)
        .with_memory_limit(1 << 20);
    let mut fib = Fib::<Dxr>::new_with_config(config)?;
    fib.route_add(0x0a00_0000, 8, A)?;
    let stats = fib.commit()?;
    assert!(stats.mem_size < 1 << 20);

    fib.route_add(0x0a01_0000, 16, B)?;
    fib.commit()?;
    assert_eq!(fib.lookup(0x0a01_0001), B);

    // Shrink the limit below what a chunk table needs.
    let mut config = *fib.config();
    config.set_memory_limit(Some(1 << 12));
    let mut small = Fib::<Dxr>::new_with_config(config)?;
    small.route_add(0x0a00_0000, 8, A)?;
    assert_eq!(small.commit(), Err(FibError::OutOfMemory));
    assert_eq!(small.generation(), 0);
    assert_eq!(small.lookup(0x0a00_0001), NextHop::NO_ENTRY);
    assert!(small.stats().table.is_none());
    Ok(())
}

#[test]
fn sail_keeps_previous_table() -> Result<(), Box<dyn std::error::Error>> {
    crate::common::init();

    // Level 16 alone is 256KiB, every expanded /16 adds a 2KiB block (and
    // its c24 twin), every expanded /24 a 1KiB block.
    let limit = (1 << 18) + (1 << 13);
    let config = SailConfig::default().with_memory_limit(limit);
    let mut fib = Fib::<Sail>::new_with_config(config)?;

    fib.route_add(0x0a00_0000, 8, A)?;
    fib.route_add(0x0a01_0100, 24, B)?;
    fib.commit()?;
    assert_eq!(fib.lookup(0x0a01_0101), B);
    assert_eq!(fib.generation(), 1);

    // Host routes in many different /16s need far more level 24 and level
    // 32 blocks than the limit allows.
    for i in 0..64_u32 {
        fib.route_add(0x0b00_0001 | (i << 16), 32, B)?;
    }
    assert_eq!(fib.commit(), Err(FibError::OutOfMemory));

    // Lookups still go to the first table.
    assert_eq!(fib.generation(), 1);
    assert_eq!(fib.lookup(0x0a01_0101), B);
    assert_eq!(fib.lookup(0x0a02_0101), A);
    assert_eq!(fib.lookup(0x0b00_0001), NextHop::NO_ENTRY);
    assert_eq!(fib.stats().routes, 66);
    Ok(())
}
