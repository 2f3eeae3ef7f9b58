#[doc(hidden)]
#[macro_export]
macro_rules! dict {
    ($($key:expr => $value:expr),* $(,)?) => ({
        #[allow(unused_mut)]
        let mut dict: $crate::value::Dict = $crate::value::Dict::new();
        $(dict.insert($key.into(), $value.into());)*
        dict
    });
}

#[doc(hidden)]
#[macro_export]
macro_rules! time {
    ($label:expr => $($token:tt)*) => ({
        let start = std::time::Instant::now();
        let value = { $($token)* };
        println!("{} time: {}ms", $label, start.elapsed().as_millis());
        value
    });
}

pub use {dict, time};
