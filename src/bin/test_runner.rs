// yatf self-test runner: exercises the public API end to end.
// Usage: cargo run --bin test_runner -- [--no-color] [--oneliners] [--fails-only] [suite.case]
//
// `broken.deliberate_failure` fails on purpose, so a full run exits with 1.

use yatf::matcher::{ge, ANY};
use yatf::{mock, require, require_call, require_eq, require_false, yatf_test};

trait Storage {
    fn load(&self, key: u32) -> i32;
    fn store(&self, key: u32, value: i32);
}

struct MockStorage {
    load: yatf::Mock<(u32,), i32>,
    store: yatf::Mock<(u32, i32)>,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self {
            load: yatf::Mock::new("load"),
            store: yatf::Mock::new("store"),
        }
    }
}

impl Storage for MockStorage {
    fn load(&self, key: u32) -> i32 {
        self.load.call((key,))
    }

    fn store(&self, key: u32, value: i32) {
        self.store.call((key, value))
    }
}

fn increment(storage: &dyn Storage, key: u32) -> i32 {
    let value = storage.load(key) + 1;
    storage.store(key, value);
    value
}

#[derive(Default)]
struct Counter {
    value: u32,
}

impl Counter {
    fn bump(&mut self) {
        self.value += 1;
    }
}

yatf_test!(demo, arithmetic, {
    require_eq!(2 + 2, 4);
    require!(7 > 3);
    require_false!(7 < 3);
});

yatf_test!(demo, strings, {
    let name = String::from("yatf");
    require_eq!(name, "yatf");
    require!(name.starts_with('y'));
});

yatf_test!(demo, fixture, Counter, |counter| {
    require_eq!(counter.value, 0);
    counter.bump();
    counter.bump();
    require_eq!(counter.value, 2);
});

yatf_test!(demo, mocked_storage, MockStorage, |storage| {
    let _load = require_call!(storage.load).for_arguments((7,)).will_return(41);
    let _store = require_call!(storage.store).for_arguments((7, ge(42)));
    require_eq!(increment(storage, 7), 42);
});

yatf_test!(demo, inline_mock, {
    mock!(sum: fn(i32, i32) -> i32);
    let _fours = require_call!(sum).for_arguments((ANY, 4)).will_return(8).times(2);
    require_eq!(sum.call((4, 4)), 8);
    require_eq!(sum.call((1, 4)), 8);
    require_eq!(sum.call((4, 1)), 0);
});

yatf_test!(broken, deliberate_failure, {
    require_eq!(1, 1);
    require!(false);
    require_false!(true);
});

fn main() {
    yatf::cli::run()
}
