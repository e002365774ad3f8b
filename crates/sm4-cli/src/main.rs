//! Command-line interface for `sm4-accel`.

#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sm4_accel::dispatch;
use sm4_accel::{Block, Sm4Accel, Sm4Key};

/// SM4 through the guarded accelerator facade.
#[derive(Parser)]
#[command(name = "sm4accel", version, author, about = "Guarded SM4 operations")]
struct Cli {
    /// Use the portable kernel even when an accelerated one is available.
    #[arg(long, global = true, default_value_t = false)]
    force_portable: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Ecb,
    Cbc,
    Ctr,
    Xts,
}

#[derive(clap::Args)]
struct CryptArgs {
    /// Mode of operation.
    #[arg(long, value_enum)]
    mode: Mode,
    /// SM4 key as 32 hex characters (the data key for XTS).
    #[arg(long, value_name = "HEX")]
    key_hex: String,
    /// XTS tweak key as 32 hex characters.
    #[arg(long, value_name = "HEX")]
    tweak_key_hex: Option<String>,
    /// IV, initial counter or XTS sector tweak as 32 hex characters.
    #[arg(long, value_name = "HEX")]
    iv_hex: Option<String>,
    /// Input file.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Output file.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file.
    Enc(CryptArgs),
    /// Decrypt a file.
    Dec(CryptArgs),
    /// Compare the selected kernel against the portable kernel on random data.
    Check {
        /// Number of random samples per mode.
        #[arg(long, default_value_t = 16)]
        samples: usize,
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run every mode on random data and decrypt it back.
    Demo {
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show the registered kernels and which one is selected.
    Info,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let accel = if cli.force_portable {
        Sm4Accel::portable()
    } else {
        Sm4Accel::new()
    };
    log::debug!("using kernel {}", accel.kernel_name());

    match cli.command {
        Commands::Enc(args) => cmd_crypt(&accel, &args, true),
        Commands::Dec(args) => cmd_crypt(&accel, &args, false),
        Commands::Check { samples, seed } => cmd_check(&accel, samples, seed),
        Commands::Demo { seed } => cmd_demo(&accel, seed),
        Commands::Info => cmd_info(&accel),
    }
}

fn cmd_crypt(accel: &Sm4Accel, args: &CryptArgs, encrypt: bool) -> Result<()> {
    let key = parse_key_hex(&args.key_hex)?;
    let mut data =
        fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;

    match args.mode {
        Mode::Ecb => {
            if encrypt {
                accel.ecb_in_place(&accel.derive_enc(&key)?, &mut data)?;
            } else {
                accel.ecb_in_place(&accel.derive_dec(&key)?, &mut data)?;
            }
        }
        Mode::Cbc => {
            let mut iv = require_iv(args)?;
            if encrypt {
                accel.cbc_encrypt_in_place(&accel.derive_enc(&key)?, &mut data, &mut iv)?;
            } else {
                accel.cbc_decrypt_in_place(&accel.derive_dec(&key)?, &mut data, &mut iv)?;
            }
        }
        Mode::Ctr => {
            let mut counter = require_iv(args)?;
            accel.ctr_crypt_in_place(&accel.derive_enc(&key)?, &mut data, &mut counter)?;
        }
        Mode::Xts => {
            let mut iv = require_iv(args)?;
            let tweak_hex = args
                .tweak_key_hex
                .as_deref()
                .context("XTS needs --tweak-key-hex")?;
            let tweak = accel.derive_enc(&parse_key_hex(tweak_hex)?)?;
            if encrypt {
                accel.xts_encrypt_in_place(&accel.derive_enc(&key)?, &tweak, &mut data, &mut iv)?;
            } else {
                accel.xts_decrypt_in_place(&accel.derive_dec(&key)?, &tweak, &mut data, &mut iv)?;
            }
        }
    }

    write_output(&args.output, &data)
}

fn cmd_check(accel: &Sm4Accel, samples: usize, seed: Option<u64>) -> Result<()> {
    let reference = Sm4Accel::portable();
    let mut rng = seeded_rng(seed);

    let zero = Sm4Key::from([0u8; 16]);
    let mut block = [0u8; 16];
    accel.ecb_in_place(&accel.derive_enc(&zero)?, &mut block)?;
    ensure!(
        hex::encode(block) == "9f1f7bff6f5511384d9430531e538fd3",
        "all-zero known answer mismatch on {}",
        accel.kernel_name()
    );

    for _ in 0..samples {
        let key = random_key(&mut rng);
        let tweak_key = random_key(&mut rng);
        let blocks = rng.gen_range(1..=32);
        let mut data = vec![0u8; blocks * 16];
        rng.fill_bytes(&mut data);
        let iv: Block = rng.gen();

        for mode in [Mode::Ecb, Mode::Cbc, Mode::Ctr, Mode::Xts] {
            let actual = run_mode(accel, mode, &key, &tweak_key, &data, iv)?;
            let expected = run_mode(&reference, mode, &key, &tweak_key, &data, iv)?;
            if actual != expected {
                bail!("{mode:?} mismatch between {} and portable", accel.kernel_name());
            }
        }
    }
    println!("{}: {samples} samples per mode agree with portable", accel.kernel_name());
    Ok(())
}

fn cmd_demo(accel: &Sm4Accel, seed: Option<u64>) -> Result<()> {
    let mut rng = seeded_rng(seed);
    let key = random_key(&mut rng);
    let tweak_key = random_key(&mut rng);
    let iv: Block = rng.gen();
    let mut plaintext = [0u8; 48];
    rng.fill_bytes(&mut plaintext);

    println!("kernel: {}", accel.kernel_name());
    println!("key: {}", hex::encode(key.0));
    println!("iv: {}", hex::encode(iv));
    println!("plaintext: {}", hex::encode(plaintext));

    let enc = accel.derive_enc(&key)?;
    let dec = accel.derive_dec(&key)?;
    let tweak = accel.derive_enc(&tweak_key)?;

    for mode in [Mode::Ecb, Mode::Cbc, Mode::Ctr, Mode::Xts] {
        let mut data = plaintext;
        let mut state = iv;
        match mode {
            Mode::Ecb => accel.ecb_in_place(&enc, &mut data)?,
            Mode::Cbc => accel.cbc_encrypt_in_place(&enc, &mut data, &mut state)?,
            Mode::Ctr => accel.ctr_crypt_in_place(&enc, &mut data, &mut state)?,
            Mode::Xts => accel.xts_encrypt_in_place(&enc, &tweak, &mut data, &mut state)?,
        }
        let ciphertext = hex::encode(data);

        let mut state = iv;
        match mode {
            Mode::Ecb => accel.ecb_in_place(&dec, &mut data)?,
            Mode::Cbc => accel.cbc_decrypt_in_place(&dec, &mut data, &mut state)?,
            Mode::Ctr => accel.ctr_crypt_in_place(&enc, &mut data, &mut state)?,
            Mode::Xts => accel.xts_decrypt_in_place(&dec, &tweak, &mut data, &mut state)?,
        }
        println!("{mode:?}: {ciphertext}");
        if data != plaintext {
            bail!("{mode:?} demo roundtrip failed");
        }
    }
    Ok(())
}

fn cmd_info(accel: &Sm4Accel) -> Result<()> {
    for candidate in dispatch::candidates() {
        let available = if (candidate.available)() { "available" } else { "unavailable" };
        println!("{:<16} {available}", candidate.name);
    }
    println!("selected: {}", accel.kernel_name());
    Ok(())
}

fn run_mode(
    accel: &Sm4Accel,
    mode: Mode,
    key: &Sm4Key,
    tweak_key: &Sm4Key,
    data: &[u8],
    iv: Block,
) -> Result<(Vec<u8>, Block)> {
    let enc = accel.derive_enc(key)?;
    let mut out = vec![0u8; data.len()];
    let mut state = iv;
    match mode {
        Mode::Ecb => accel.ecb(&enc, data, &mut out)?,
        Mode::Cbc => accel.cbc_encrypt(&enc, data, &mut out, &mut state)?,
        Mode::Ctr => accel.ctr_crypt(&enc, data, &mut out, &mut state)?,
        Mode::Xts => {
            let tweak = accel.derive_enc(tweak_key)?;
            accel.xts_encrypt(&enc, &tweak, data, &mut out, &mut state)?
        }
    }
    Ok((out, state))
}

fn parse_key_hex(hex_str: &str) -> Result<Sm4Key> {
    Ok(Sm4Key::from(parse_block_hex(hex_str, "SM4 key")?))
}

fn parse_block_hex(hex_str: &str, what: &str) -> Result<Block> {
    let bytes = hex::decode(hex_str.trim()).with_context(|| format!("decode {what} hex"))?;
    if bytes.len() != 16 {
        bail!("{what} must be 16 bytes (32 hex characters)");
    }
    let mut block = [0u8; 16];
    block.copy_from_slice(&bytes);
    Ok(block)
}

fn require_iv(args: &CryptArgs) -> Result<Block> {
    let hex_str = args
        .iv_hex
        .as_deref()
        .with_context(|| format!("{:?} needs --iv-hex", args.mode))?;
    parse_block_hex(hex_str, "IV")
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data).with_context(|| format!("write {}", path.display()))
}

fn random_key(rng: &mut impl RngCore) -> Sm4Key {
    let mut key = [0u8; 16];
    rng.fill_bytes(&mut key);
    Sm4Key::from(key)
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    match seed {
        Some(value) => {
            let mut seed_bytes = [0u8; 32];
            seed_bytes[..8].copy_from_slice(&value.to_le_bytes());
            ChaCha20Rng::from_seed(seed_bytes)
        }
        None => {
            let mut seed_bytes = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed_bytes);
            ChaCha20Rng::from_seed(seed_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_keys_and_rejects_bad_lengths() {
        let key = parse_key_hex(" 0123456789abcdeffedcba9876543210 ").expect("key");
        assert_eq!(key.0[0], 0x01);
        assert!(parse_key_hex("0123").is_err());
        assert!(parse_block_hex("zz", "IV").is_err());
    }

    #[test]
    fn file_round_trip_for_each_mode() {
        let dir = std::env::temp_dir().join(format!("sm4accel-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("mkdir");
        let plain: Vec<u8> = (0..64u8).collect();
        let input = dir.join("plain.bin");
        fs::write(&input, &plain).expect("write plain");
        let accel = Sm4Accel::portable();

        for mode in [Mode::Ecb, Mode::Cbc, Mode::Ctr, Mode::Xts] {
            let cipher = dir.join(format!("{mode:?}.enc"));
            let back = dir.join(format!("{mode:?}.dec"));
            let args = |input: &Path, output: &Path| CryptArgs {
                mode,
                key_hex: "0123456789abcdeffedcba9876543210".into(),
                tweak_key_hex: Some("fedcba98765432100123456789abcdef".into()),
                iv_hex: Some("000102030405060708090a0b0c0d0e0f".into()),
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            };
            cmd_crypt(&accel, &args(&input, &cipher), true).expect("encrypt");
            cmd_crypt(&accel, &args(&cipher, &back), false).expect("decrypt");
            assert_eq!(fs::read(&back).expect("read"), plain, "{mode:?}");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn bad_lengths_surface_library_contract_errors() {
        use sm4_accel::{AccelError, ContractViolation};

        let dir = std::env::temp_dir().join(format!("sm4accel-cli-len-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("mkdir");
        let accel = Sm4Accel::portable();
        let cases = [
            (Mode::Ecb, 0usize, ContractViolation::Empty),
            (Mode::Cbc, 20, ContractViolation::Misaligned { len: 20 }),
            (Mode::Xts, 15, ContractViolation::ShortXts { len: 15 }),
        ];

        for (mode, len, expected) in cases {
            let input = dir.join(format!("{mode:?}-{len}.bin"));
            let output = dir.join(format!("{mode:?}-{len}.out"));
            fs::write(&input, vec![0u8; len]).expect("write input");
            let args = CryptArgs {
                mode,
                key_hex: "0123456789abcdeffedcba9876543210".into(),
                tweak_key_hex: Some("fedcba98765432100123456789abcdef".into()),
                iv_hex: Some("000102030405060708090a0b0c0d0e0f".into()),
                input,
                output: output.clone(),
            };
            let err = cmd_crypt(&accel, &args, true).unwrap_err();
            assert_eq!(
                err.downcast_ref::<AccelError>(),
                Some(&AccelError::Contract(expected)),
                "{mode:?} with {len} bytes"
            );
            assert!(!output.exists(), "nothing written on rejection");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn check_and_demo_succeed_with_seed() {
        let accel = Sm4Accel::new();
        cmd_check(&accel, 2, Some(1)).expect("check");
        cmd_demo(&accel, Some(2)).expect("demo");
    }
}
