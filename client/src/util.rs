use stratboard_shared::ClientId;

fn random_u32() -> u32 {
    (js_sys::Math::random() * (u32::MAX as f64 + 1.0)) as u32
}

pub fn make_client_id() -> ClientId {
    let now = js_sys::Date::now() as u64;
    ClientId::from_parts(now, random_u32())
}
