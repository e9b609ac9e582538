use anyhow::Result;
use prost::Message;

use crate::grpc::{PipelineConfiguration, SegmentConfiguration};
use crate::utils;

#[test]
fn stable_hash_32_is_deterministic() {
    let lhs = utils::stable_hash_32(b"detector");
    let rhs = utils::stable_hash_32(b"detector");
    assert_eq!(lhs, rhs, "expected identical hashes for identical input");
    assert_ne!(lhs, utils::stable_hash_32(b"classifier"), "expected distinct hashes for distinct input");
}

#[test]
fn segment_address_packs_name_hash_over_instance() {
    let name_hash = utils::stable_hash_32(b"detector");
    let address = utils::encode_segment_address(name_hash, 42);
    assert_eq!((address >> 32) as u32, name_hash, "upper half must carry the name hash");
    assert_eq!(address & 0xffff_ffff, 42, "lower half must carry the instance id");
}

#[test]
fn segment_address_truncates_high_instance_bits() {
    let address = utils::encode_segment_address(7, u64::MAX);
    assert_eq!(address & 0xffff_ffff, u64::from(u32::MAX));
    assert_eq!((address >> 32) as u32, 7, "instance overflow must not bleed into the name hash");
}

#[test]
fn encoded_models_decode_back_equal() -> Result<()> {
    let config = PipelineConfiguration {
        segments: vec![SegmentConfiguration {
            name: "detector".into(),
            ingress_ports: vec![],
            egress_ports: vec!["frames".into()],
        }],
        manifolds: vec![],
    };
    let bytes = utils::encode_model(&config)?;
    let decoded = PipelineConfiguration::decode(bytes.as_slice())?;
    assert_eq!(config, decoded, "expected the encoded config to decode back structurally equal");
    Ok(())
}

#[test]
fn identical_configs_hash_identically() -> Result<()> {
    let config = PipelineConfiguration {
        segments: vec![SegmentConfiguration {
            name: "detector".into(),
            ingress_ports: vec!["frames".into()],
            egress_ports: vec![],
        }],
        manifolds: vec![],
    };
    let lhs = utils::stable_hash_64(&utils::encode_model(&config)?);
    let rhs = utils::stable_hash_64(&utils::encode_model(&config.clone())?);
    assert_eq!(lhs, rhs, "expected identical definition ids for identical configs");
    Ok(())
}
