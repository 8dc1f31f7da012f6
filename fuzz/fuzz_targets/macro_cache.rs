#![no_main]

use hlasm_core::ident_storage::IdStorage;
use hlasm_core::location::ResourceLocation;
use hlasm_core::macro_cache::{CopyDefinition, MacroCache, MacroCacheKey, MacroDefinition, OpsynMnemo};
use libfuzzer_sys::fuzz_target;
use std::rc::Rc;

const MAX_OPS: usize = 64;

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next_byte(&mut self) -> u8 {
        let b = self.bytes.get(self.pos).copied().unwrap_or(0);
        self.pos += 1;
        b
    }

    fn member_name(&mut self) -> String {
        format!("MEMBER{}", self.next_byte() % 5)
    }

    fn opsyn_state(&mut self) -> Vec<OpsynMnemo> {
        let count = self.next_byte() % 3;
        (0..count)
            .map(|_| OpsynMnemo {
                from: format!("OP{}", self.next_byte() % 4).into(),
                to: format!("OP{}", self.next_byte() % 4).into(),
                is_macro: self.next_byte() % 2 == 0,
            })
            .collect()
    }
}

fuzz_target!(|data: &[u8]| {
    let mut cur = Cursor { bytes: data, pos: 0 };
    let mut cache = MacroCache::new();
    let storages: Vec<_> = (0..3).map(|_| IdStorage::new_shared()).collect();
    let mut versions: std::collections::HashMap<ResourceLocation, i32> = std::collections::HashMap::new();

    for _ in 0..data.len().min(MAX_OPS) {
        let storage = &storages[usize::from(cur.next_byte()) % storages.len()];
        let data_loc = ResourceLocation::new(format!("lib:///{}", cur.next_byte() % 3));
        let member = cur.member_name();
        let opsyn = cur.opsyn_state();
        let key = MacroCacheKey::create_from_context(storage, data_loc.clone(), opsyn);

        let own_version = i32::from(cur.next_byte());
        versions.insert(data_loc.clone(), own_version);
        let stamps = vec![(data_loc.clone(), own_version)];

        match cur.next_byte() % 3 {
            0 => {
                let def = Rc::new(MacroDefinition { name: member.into(), resource: data_loc });
                cache.save_macro(key, def, stamps);
            }
            1 => {
                let def = Rc::new(CopyDefinition { name: member.into(), resource: data_loc });
                cache.save_copy(key, def, stamps);
            }
            _ => {
                let _ = cache.load_from_cache(&key, &member, |loc| versions.get(loc).copied());
            }
        }
    }

    cache.erase_unused();
    let _ = cache.len();
    let _ = cache.is_empty();

    drop(storages);
    cache.erase_unused();
});
