macro_rules! static_assert_send {
  ($T:ty) => {
    const _: fn() = || {
      fn assert_send<T: Send>() {}
      let _ = assert_send::<$T>;
    };
  };
}

macro_rules! static_assert_sync {
  ($T:ty) => {
    const _: fn() = || {
      fn assert_sync<T: Sync>() {}
      let _ = assert_sync::<$T>;
    };
  };
}
