use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const PASSPHRASE_ENV: &str = "KEYSEAL_PASSPHRASE";
/// Read by `passwd` for the replacement passphrase.
pub const NEW_PASSPHRASE_ENV: &str = "KEYSEAL_NEW_PASSPHRASE";

/// Passphrase for an existing key file.
///
/// Sources, in order: `KEYSEAL_PASSPHRASE`, one line of piped stdin, an
/// interactive prompt.
pub fn read_passphrase(prompt: &str) -> Result<Zeroizing<String>> {
    //  KEYSEAL_PASSPHRASE="correct horse" keyseal unlock key.json
    if let Some(pw) = passphrase_from_env(PASSPHRASE_ENV) {
        return Ok(pw);
    }

    //  printf "%s\n" "$PASS" | keyseal unlock key.json
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(buf);
        }
        bail!("No passphrase provided");
    }

    let pw = Zeroizing::new(rpassword::prompt_password(prompt)?);
    if pw.is_empty() {
        bail!("No passphrase provided");
    }
    Ok(pw)
}

/// Passphrase for a key file about to be written. Interactive and piped
/// input must repeat it twice; the environment variable `env` is taken as is.
pub fn read_new_passphrase_with_confirmation(env: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = passphrase_from_env(env) {
        return Ok(pw);
    }

    let (pw1, pw2) = if !io::stdin().is_terminal() {
        let stdin = io::stdin();
        let mut handle = stdin.lock();

        let mut pw1 = Zeroizing::new(String::new());
        let mut pw2 = Zeroizing::new(String::new());

        handle.read_line(&mut pw1)?;
        handle.read_line(&mut pw2)?;

        trim_newline(&mut pw1);
        trim_newline(&mut pw2);
        (pw1, pw2)
    } else {
        (
            Zeroizing::new(rpassword::prompt_password("New passphrase: ")?),
            Zeroizing::new(rpassword::prompt_password("Confirm passphrase: ")?),
        )
    };

    if pw1.is_empty() {
        bail!("passphrase cannot be empty");
    }

    if pw1 != pw2 {
        bail!("passphrases do not match");
    }

    Ok(pw1)
}

fn passphrase_from_env(name: &str) -> Option<Zeroizing<String>> {
    std::env::var(name)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
