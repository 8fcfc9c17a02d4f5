// Create a test for every backend (and the DXR backend with its smallest
// chunk size besides the default one) out of a function that takes a fresh
// FIB.
#[macro_export]
#[doc(hidden)]
macro_rules! all_backends {
    ( $( $fn_name: ident; $test_name: ident ), * ) => {

        $(
            #[test]
            fn $fn_name() -> Result<(), Box<dyn std::error::Error>> {
                //------- DXR, default chunks

                println!("dxr backend starting...");
                let fib = $crate::fib::Fib::<$crate::Dxr>::try_default()?;

                $test_name(fib)?;

                //------- DXR, /16 chunks

                println!("dxr backend (/16 chunks) starting...");
                let config = $crate::fib::config::DxrConfig::default()
                    .with_chunk_bits(16);
                let fib =
                    $crate::fib::Fib::<$crate::Dxr>::new_with_config(config)?;

                $test_name(fib)?;

                //------- SAIL

                println!("sail backend starting...");
                let fib = $crate::fib::Fib::<$crate::Sail>::try_default()?;

                $test_name(fib)?;

                Ok(())
            }
        )*
    };
}
