mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    use inetnum::addr::Prefix;
    use rotonda_fib::{
        errors::FibError,
        fib::{Backend, Fib},
        NextHop,
    };

    const A: NextHop = NextHop::new(1);
    const B: NextHop = NextHop::new(2);
    const C: NextHop = NextHop::new(3);

    fn ip(s: &str) -> Result<u32, Box<dyn std::error::Error>> {
        Ok(u32::from(Ipv4Addr::from_str(s)?))
    }

    rotonda_fib::all_backends![
        default_route;
        test_default_route
    ];

    fn test_default_route<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        fib.route_add(0, 0, A)?;
        fib.commit()?;

        for addr in [
            0,
            ip("10.1.2.3")?,
            ip("127.0.0.1")?,
            ip("192.168.1.1")?,
            ip("255.255.255.255")?,
        ] {
            assert_eq!(fib.lookup(addr), A);
        }
        Ok(())
    }

    rotonda_fib::all_backends![
        default_and_specific;
        test_default_and_specific
    ];

    fn test_default_and_specific<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        fib.insert(&Prefix::from_str("0.0.0.0/0")?, A)?;
        fib.insert(&Prefix::from_str("10.0.0.0/8")?, B)?;
        fib.commit()?;

        assert_eq!(fib.lookup(ip("10.1.2.3")?), B);
        assert_eq!(fib.lookup(ip("192.168.1.1")?), A);
        assert_eq!(fib.lookup(ip("9.255.255.255")?), A);
        assert_eq!(fib.lookup(ip("10.0.0.0")?), B);
        assert_eq!(fib.lookup(ip("10.255.255.255")?), B);
        assert_eq!(fib.lookup(ip("11.0.0.0")?), A);
        Ok(())
    }

    rotonda_fib::all_backends![
        nested_routes;
        test_nested_routes
    ];

    fn test_nested_routes<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        fib.insert(&Prefix::from_str("10.0.0.0/8")?, A)?;
        fib.insert(&Prefix::from_str("10.1.0.0/16")?, B)?;
        fib.insert(&Prefix::from_str("10.1.1.0/24")?, C)?;
        fib.commit()?;

        assert_eq!(fib.lookup(ip("10.1.1.5")?), C);
        assert_eq!(fib.lookup(ip("10.1.2.5")?), B);
        assert_eq!(fib.lookup(ip("10.2.0.0")?), A);
        assert_eq!(fib.lookup(ip("10.1.0.255")?), B);
        assert_eq!(fib.lookup(ip("10.1.1.255")?), C);
        assert_eq!(fib.lookup(ip("11.0.0.0")?), NextHop::NO_ENTRY);
        Ok(())
    }

    rotonda_fib::all_backends![
        no_routes;
        test_no_routes
    ];

    fn test_no_routes<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        // Nothing published yet.
        assert_eq!(fib.lookup(ip("1.2.3.4")?), NextHop::NO_ENTRY);
        assert!(fib.stats().table.is_none());

        fib.commit()?;
        for addr in [0, ip("1.2.3.4")?, ip("172.16.0.1")?, u32::MAX] {
            assert_eq!(fib.lookup(addr), NextHop::NO_ENTRY);
        }
        assert_eq!(fib.generation(), 1);
        Ok(())
    }

    rotonda_fib::all_backends![
        host_route;
        test_host_route
    ];

    fn test_host_route<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        let x = NextHop::new(24);
        let y = NextHop::new(25);
        fib.route_add(ip("1.2.3.4")?, 32, x)?;
        fib.route_add(ip("1.2.3.0")?, 24, y)?;
        fib.commit()?;

        assert_eq!(fib.lookup(ip("1.2.3.4")?), x);
        assert_eq!(fib.lookup(ip("1.2.3.5")?), y);
        assert_eq!(fib.lookup(ip("1.2.3.3")?), y);
        assert_eq!(fib.lookup(ip("1.2.4.4")?), NextHop::NO_ENTRY);
        Ok(())
    }

    rotonda_fib::all_backends![
        extremes;
        test_extremes
    ];

    fn test_extremes<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        fib.route_add(0, 32, A)?;
        fib.route_add(u32::MAX, 32, B)?;
        fib.route_add(0, 1, C)?;
        fib.commit()?;

        assert_eq!(fib.lookup(0), A);
        assert_eq!(fib.lookup(1), C);
        assert_eq!(fib.lookup(ip("127.255.255.255")?), C);
        assert_eq!(fib.lookup(ip("128.0.0.0")?), NextHop::NO_ENTRY);
        assert_eq!(fib.lookup(u32::MAX - 1), NextHop::NO_ENTRY);
        assert_eq!(fib.lookup(u32::MAX), B);
        Ok(())
    }

    rotonda_fib::all_backends![
        duplicate_route;
        test_duplicate_route
    ];

    fn test_duplicate_route<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        fib.route_add(ip("10.0.0.0")?, 8, A)?;
        assert_eq!(
            fib.route_add(ip("10.0.0.0")?, 8, B),
            Err(FibError::DuplicateRoute)
        );
        // Host bits don't make it a different route.
        assert_eq!(
            fib.route_add(ip("10.9.9.9")?, 8, B),
            Err(FibError::DuplicateRoute)
        );
        assert_eq!(fib.trie().len(), 1);
        assert_eq!(fib.nexthops().len(), 1);

        fib.commit()?;
        assert_eq!(fib.lookup(ip("10.1.1.1")?), A);
        Ok(())
    }

    rotonda_fib::all_backends![
        invalid_routes;
        test_invalid_routes
    ];

    fn test_invalid_routes<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        assert_eq!(
            fib.route_add(0, 33, A),
            Err(FibError::PrefixLengthInvalid)
        );
        assert_eq!(
            fib.route_add(0, 0, NextHop::NO_ENTRY),
            Err(FibError::NextHopInvalid)
        );
        assert_eq!(
            fib.insert(&Prefix::from_str("2001:db8::/32")?, A),
            Err(FibError::AddressFamilyInvalid)
        );
        assert!(fib.trie().is_empty());
        Ok(())
    }

    rotonda_fib::all_backends![
        routes_wait_for_commit;
        test_routes_wait_for_commit
    ];

    fn test_routes_wait_for_commit<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        fib.route_add(ip("10.0.0.0")?, 8, A)?;
        assert_eq!(fib.lookup(ip("10.0.0.1")?), NextHop::NO_ENTRY);
        fib.commit()?;
        assert_eq!(fib.lookup(ip("10.0.0.1")?), A);

        fib.route_add(ip("10.0.0.0")?, 24, B)?;
        assert_eq!(fib.lookup(ip("10.0.0.1")?), A);
        fib.commit()?;
        assert_eq!(fib.lookup(ip("10.0.0.1")?), B);
        assert_eq!(fib.lookup(ip("10.0.1.1")?), A);
        assert_eq!(fib.generation(), 2);
        Ok(())
    }

    rotonda_fib::all_backends![
        shared_next_hops;
        test_shared_next_hops
    ];

    fn test_shared_next_hops<B: Backend>(
        mut fib: Fib<B>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        crate::common::init();

        fib.route_add(ip("10.0.0.0")?, 8, A)?;
        fib.route_add(ip("172.16.0.0")?, 12, A)?;
        fib.route_add(ip("192.168.0.0")?, 16, B)?;
        fib.route_add(ip("192.168.10.0")?, 24, A)?;
        let stats = fib.commit()?;

        assert_eq!(fib.nexthops().len(), 2);
        assert_eq!(stats.next_hops, 2);
        assert_eq!(fib.lookup(ip("172.31.255.255")?), A);
        assert_eq!(fib.lookup(ip("192.168.10.10")?), A);
        assert_eq!(fib.lookup(ip("192.168.11.10")?), B);

        let fib_stats = fib.stats();
        assert_eq!(fib_stats.routes, 4);
        assert_eq!(fib_stats.table, Some(stats));
        Ok(())
    }
}
