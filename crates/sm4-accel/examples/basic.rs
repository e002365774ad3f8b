//! Demonstrates deriving both schedules and running a CBC round trip.

use sm4_accel::{Sm4Accel, Sm4Key};

fn main() -> Result<(), sm4_accel::AccelError> {
    let accel = Sm4Accel::new();
    let key = Sm4Key::from(*b"sixteen byte key");
    let enc = accel.derive_enc(&key)?;
    let dec = accel.derive_dec(&key)?;

    let mut data = [0u8; 32];
    data[..16].copy_from_slice(b"first block here");
    data[16..].copy_from_slice(b"second blockhere");
    let original = data;

    let mut iv = [0u8; 16];
    accel.cbc_encrypt_in_place(&enc, &mut data, &mut iv)?;
    assert_eq!(iv[..], data[16..]);

    let mut iv = [0u8; 16];
    accel.cbc_decrypt_in_place(&dec, &mut data, &mut iv)?;
    assert_eq!(data, original);

    println!("example succeeded on the {} kernel", accel.kernel_name());
    Ok(())
}
