// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tpm2aca::config::{AcaConfig, AcaIdentity};
use tpm2aca::logging;
use tpm2aca::makecred::{self, CredentialBlob};
use tpm2aca::message::Codec;
use tpm2aca::provision::{
    CertificateIssuer, CertificateRequestProcessor, CredentialResolver, IdentityClaimProcessor,
};
use tpm2aca::store::{
    MemoCertificateStore, MemoChallengeStore, MemoDeviceStore, MemoPolicyStore,
    MemoTrustAnchorStore,
};
use tpm2aca::validation::TrustAnchorValidator;

const CERTIFICATES_SNAPSHOT: &str = "certificates.json";
const CHALLENGES_SNAPSHOT: &str = "challenges.json";
const DEVICES_SNAPSHOT: &str = "devices.json";

#[derive(Parser)]
enum AcaCli {
    AkName(AkNameArgs),
    MakeCredential(MakeCredentialArgs),
    ActivateCredential(ActivateCredentialArgs),
    Claim(ClaimArgs),
    Certify(CertifyArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Print the TPM name of the supplied AK public area")]
struct AkNameArgs {
    #[arg(short, long, default_value = "ak.pub")]
    ak: PathBuf,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Bind a secret to an AK and seal it to an EK, producing a \
    TPM2_ActivateCredential blob")]
struct MakeCredentialArgs {
    #[arg(short, long, default_value = "ek.pub")]
    ek: PathBuf,

    #[arg(short, long, default_value = "ak.pub")]
    ak: PathBuf,

    /// Hex encoded secret, at most 32 bytes
    #[arg(short, long)]
    secret: String,

    #[arg(short, long, default_value = "credential.blob")]
    output: PathBuf,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Recover the secret from a credential blob using the EK private \
    key (software TPM2_ActivateCredential)")]
struct ActivateCredentialArgs {
    /// PEM encoded EK private key
    #[arg(short, long, default_value = "ek.pem")]
    ek_key: PathBuf,

    #[arg(short, long, default_value = "ak.pub")]
    ak: PathBuf,

    #[arg(short, long, default_value = "credential.blob")]
    blob: PathBuf,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Process a CBOR identity claim and write the CBOR response")]
struct ClaimArgs {
    #[arg(short, long, default_value = "aca.json")]
    config: PathBuf,

    /// Directory holding the store snapshots
    #[arg(short, long, default_value = "state")]
    state: PathBuf,

    #[arg(short = 'i', long, default_value = "claim.cbor")]
    claim: PathBuf,

    #[arg(short, long, default_value = "claim-response.cbor")]
    output: PathBuf,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Process a CBOR certificate request and write the CBOR response")]
struct CertifyArgs {
    #[arg(short, long, default_value = "aca.json")]
    config: PathBuf,

    /// Directory holding the store snapshots
    #[arg(short, long, default_value = "state")]
    state: PathBuf,

    #[arg(short = 'i', long, default_value = "request.cbor")]
    request: PathBuf,

    #[arg(short, long, default_value = "certificate-response.cbor")]
    output: PathBuf,
}

fn main() {
    match AcaCli::parse() {
        AcaCli::AkName(args) => match ak_name(&args) {
            Ok(name) => println!("{name}"),
            Err(e) => eprintln!("AK name computation failed: {e}"),
        },

        AcaCli::MakeCredential(args) => match make_credential(&args) {
            Ok(_) => println!("credential blob written to {}", args.output.display()),
            Err(e) => eprintln!("make credential failed: {e}"),
        },

        AcaCli::ActivateCredential(args) => match activate_credential(&args) {
            Ok(secret) => println!("{secret}"),
            Err(e) => eprintln!("activate credential failed: {e}"),
        },

        AcaCli::Claim(args) => match claim(&args) {
            Ok(status) => println!("identity claim processed: {status}"),
            Err(e) => eprintln!("identity claim failed: {e}"),
        },

        AcaCli::Certify(args) => match certify(&args) {
            Ok(status) => println!("certificate request processed: {status}"),
            Err(e) => eprintln!("certificate request failed: {e}"),
        },
    }
}

fn ak_name(args: &AkNameArgs) -> Result<String, Box<dyn Error>> {
    let ak = makecred::parse_public_area(&fs::read(&args.ak)?)?;

    Ok(hex::encode(makecred::compute_ak_name(&ak)?))
}

fn make_credential(args: &MakeCredentialArgs) -> Result<(), Box<dyn Error>> {
    let ek = makecred::parse_public_area(&fs::read(&args.ek)?)?;
    let ak = makecred::parse_public_area(&fs::read(&args.ak)?)?;
    let secret = hex::decode(&args.secret)?;

    let blob = makecred::make_credential(&ek, &ak, &secret)?;
    fs::write(&args.output, blob.as_bytes())?;

    Ok(())
}

fn activate_credential(args: &ActivateCredentialArgs) -> Result<String, Box<dyn Error>> {
    let ek = openssl::pkey::PKey::private_key_from_pem(&fs::read(&args.ek_key)?)?;
    let ak = makecred::parse_public_area(&fs::read(&args.ak)?)?;
    let blob = CredentialBlob::from_bytes(&fs::read(&args.blob)?)?;

    Ok(hex::encode(makecred::activate_credential(&ek, &ak, &blob)?))
}

/// An ACA wired to in-memory stores seeded from, and saved back to, the
/// JSON snapshots in a state directory
struct Aca {
    state: PathBuf,
    certs: Arc<MemoCertificateStore>,
    challenges: Arc<MemoChallengeStore>,
    devices: Arc<MemoDeviceStore>,
    claims: IdentityClaimProcessor,
    requests: CertificateRequestProcessor,
}

impl Aca {
    fn open(config: &Path, state: &Path) -> Result<Self, Box<dyn Error>> {
        let config = AcaConfig::from_file(config)?;

        logging::init(&config.log.level, config.log.json);

        let certs = Arc::new(MemoCertificateStore::new());
        if let Some(j) = read_snapshot(state, CERTIFICATES_SNAPSHOT)? {
            certs.load_json(&j)?;
        }

        let challenges = Arc::new(match config.challenge_ttl_secs {
            Some(ttl) => MemoChallengeStore::with_ttl(ttl),
            None => MemoChallengeStore::new(),
        });
        if let Some(j) = read_snapshot(state, CHALLENGES_SNAPSHOT)? {
            challenges.load_json(&j)?;
        }

        let devices = Arc::new(MemoDeviceStore::new());
        if let Some(j) = read_snapshot(state, DEVICES_SNAPSHOT)? {
            devices.load_json(&j)?;
        }

        let anchors = Arc::new(MemoTrustAnchorStore::new());
        for path in &config.trust_anchors {
            anchors.load_pem(&fs::read(path)?)?;
        }

        let policy = Arc::new(MemoPolicyStore::new(config.policy.clone()));
        let validator = Arc::new(TrustAnchorValidator::new(anchors, policy.clone()));

        let issuer = Arc::new(CertificateIssuer::new(
            Arc::new(AcaIdentity::load(&config)?),
            config.validity_days,
            config.signing_digest,
            certs.clone(),
        ));

        let resolver = CredentialResolver::new(certs.clone());

        let claims = IdentityClaimProcessor::new(
            resolver.clone(),
            validator.clone(),
            challenges.clone(),
            devices.clone(),
            policy.clone(),
        );
        let requests = CertificateRequestProcessor::new(
            resolver,
            validator,
            challenges.clone(),
            devices.clone(),
            policy,
            issuer,
        );

        Ok(Self {
            state: state.to_path_buf(),
            certs,
            challenges,
            devices,
            claims,
            requests,
        })
    }

    fn save(&self) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(&self.state)?;

        fs::write(self.state.join(CERTIFICATES_SNAPSHOT), self.certs.to_json()?)?;
        fs::write(self.state.join(CHALLENGES_SNAPSHOT), self.challenges.to_json()?)?;
        fs::write(self.state.join(DEVICES_SNAPSHOT), self.devices.to_json()?)?;

        Ok(())
    }
}

fn read_snapshot(state: &Path, name: &str) -> Result<Option<String>, Box<dyn Error>> {
    let path = state.join(name);

    if !path.exists() {
        return Ok(None);
    }

    Ok(Some(fs::read_to_string(path)?))
}

fn claim(args: &ClaimArgs) -> Result<String, Box<dyn Error>> {
    let aca = Aca::open(&args.config, &args.state)?;

    let response = aca.claims.process(&fs::read(&args.claim)?)?;

    fs::write(&args.output, response.encode()?)?;
    aca.save()?;

    Ok(response.status.to_string())
}

fn certify(args: &CertifyArgs) -> Result<String, Box<dyn Error>> {
    let aca = Aca::open(&args.config, &args.state)?;

    let response = aca.requests.process(&fs::read(&args.request)?)?;

    fs::write(&args.output, response.encode()?)?;
    aca.save()?;

    Ok(response.status.to_string())
}
