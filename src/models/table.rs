//! Static model table

use super::topology::{SourceAvailability, VideoInputGenerator};
use super::{
    AudioChannelPair, AudioInputInfo, AudioPortType, AudioRoutingEndpoint, AudioRoutingSpec,
    AudioSpec, ClassicAudioSpec, FairlightAudioSpec, FairlightInputInfo, FairlightMonitorSpec,
    MediaPoolSpec, ModelId, ModelSpec,
};
use once_cell::sync::Lazy;

const DEFAULT_MACROS: u16 = 100;

pub(super) static AUTO_DETECT: Lazy<ModelSpec> = Lazy::new(|| ModelSpec {
    auxes: 1,
    mixeffects: 1,
    usks: 1,
    dsks: 1,
    multiviewers: 0,
    multiviewer_windows: 0,
    super_sources: 0,
    macros: DEFAULT_MACROS,
    media: MediaPoolSpec {
        players: 1,
        stills: 20,
        clips: 0,
    },
    inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
        .add_internal_colors_and_black(true)
        .add_external_inputs(4)
        .add_media_players(1)
        .add_auxiliary_outputs(1)
        .add_program_preview()
        .generate(),
    audio: AudioSpec::None,
    ..base(ModelId::AUTO_DETECT, "Auto Detect")
});

pub(super) static ALL_MODELS: Lazy<Vec<ModelSpec>> = Lazy::new(|| {
    vec![
        tvs(ModelId::TVS, "TV Studio"),
        ModelSpec {
            auxes: 3,
            usks: 4,
            dsks: 2,
            multiviewers: 1,
            multiviewer_windows: 10,
            media: media(2, 32, 2),
            inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
                .add_internal_colors_and_black(true)
                .add_external_inputs(8)
                .add_media_players(2)
                .add_upstream_key_masks(4)
                .add_downstream_key_masks(2)
                .add_clean_feeds(2)
                .add_auxiliary_outputs(3)
                .add_multiviewers(1)
                .add_program_preview()
                .generate(),
            audio: classic_audio(8, AudioPortType::Sdi, &[(1001, AudioPortType::Xlr)], 2),
            ..base(ModelId::ONE_ME, "1 M/E Production Switcher")
        },
        two_me(ModelId::TWO_ME, "2 M/E Production Switcher", 16, 2),
        ModelSpec {
            auxes: 1,
            usks: 1,
            dsks: 2,
            multiviewers: 1,
            multiviewer_windows: 10,
            media: media(2, 20, 2),
            inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
                .add_internal_colors_and_black(true)
                .add_external_inputs(10)
                .add_media_players(2)
                .add_upstream_key_masks(1)
                .add_downstream_key_masks(2)
                .add_clean_feeds(2)
                .add_auxiliary_outputs(1)
                .add_multiviewers(1)
                .add_program_preview()
                .generate(),
            audio: classic_audio(10, AudioPortType::Hdmi, &[(1001, AudioPortType::Xlr)], 2),
            ..base(ModelId::PS4K, "Production Studio 4K")
        },
        ModelSpec {
            auxes: 3,
            usks: 4,
            dsks: 2,
            multiviewers: 1,
            multiviewer_windows: 10,
            media: media(2, 32, 2),
            inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
                .add_internal_colors_and_black(true)
                .add_external_inputs(10)
                .add_media_players(2)
                .add_upstream_key_masks(4)
                .add_downstream_key_masks(2)
                .add_clean_feeds(2)
                .add_auxiliary_outputs(3)
                .add_multiviewers(1)
                .add_program_preview()
                .generate(),
            audio: classic_audio(10, AudioPortType::Sdi, &[(1001, AudioPortType::Xlr)], 2),
            ..base(ModelId::ONE_ME_4K, "1 M/E Production Studio 4K")
        },
        two_me(ModelId::TWO_ME_4K, "2 M/E Production Studio 4K", 20, 4),
        two_me(
            ModelId::TWO_ME_BS4K,
            "2 M/E Broadcast Studio 4K",
            20,
            4,
        ),
        tvs(ModelId::TVS_HD, "Television Studio HD"),
        tvs(ModelId::TVS_PRO_HD, "Television Studio Pro HD"),
        ModelSpec {
            audio: fairlight_audio(
                8,
                AudioPortType::Sdi,
                &[(1001, AudioPortType::Xlr), (1201, AudioPortType::Rca)],
                2,
                Some(FairlightMonitorSpec::Headphones),
                None,
            ),
            ..tvs(ModelId::TVS_PRO_4K, "Television Studio Pro 4K")
        },
        constellation(ModelId::CONSTELLATION_8K, "Constellation 8K", 4, 40, 24),
        mini(ModelId::MINI, "Mini", false, false, 0),
        mini(ModelId::MINI_PRO, "Mini Pro", true, false, 1),
        mini(ModelId::MINI_PRO_ISO, "Mini Pro ISO", true, true, 1),
        mini_extreme(ModelId::MINI_EXTREME, "Mini Extreme", false),
        mini_extreme(ModelId::MINI_EXTREME_ISO, "Mini Extreme ISO", true),
        constellation(ModelId::CONSTELLATION_HD_1ME, "Constellation HD 1 M/E", 1, 10, 6),
        constellation(ModelId::CONSTELLATION_HD_2ME, "Constellation HD 2 M/E", 2, 20, 12),
        constellation(ModelId::CONSTELLATION_HD_4ME, "Constellation HD 4 M/E", 4, 40, 24),
        sdi(ModelId::SDI, "SDI", false, 0),
        sdi(ModelId::SDI_PRO_ISO, "SDI Pro ISO", true, 1),
        ModelSpec {
            record_iso: true,
            ..mini_extreme(ModelId::SDI_EXTREME_ISO, "SDI Extreme ISO", true)
        },
        tvs_hd8(ModelId::TVS_HD8, "Television Studio HD8", false),
        tvs_hd8(ModelId::TVS_HD8_ISO, "Television Studio HD8 ISO", true),
        ModelSpec {
            media: media(2, 20, 2),
            ..tvs_hd8(ModelId::TVS_4K8, "Television Studio 4K8", true)
        },
    ]
});

fn base(id: ModelId, label: &str) -> ModelSpec {
    ModelSpec {
        id,
        label: label.to_string(),
        auxes: 0,
        mixeffects: 1,
        usks: 0,
        dsks: 0,
        multiviewers: 0,
        multiviewer_windows: 0,
        super_sources: 0,
        macros: DEFAULT_MACROS,
        media: MediaPoolSpec::default(),
        streaming: false,
        recording: false,
        record_iso: false,
        inputs: Vec::new(),
        audio: AudioSpec::None,
    }
}

fn media(players: u8, stills: u16, clips: u8) -> MediaPoolSpec {
    MediaPoolSpec {
        players,
        stills,
        clips,
    }
}

/// Inputs `1..=external`, then the given extra connectors, then one input per media player
fn classic_audio(
    external: u16,
    port_type: AudioPortType,
    extras: &[(u16, AudioPortType)],
    media_players: u8,
) -> AudioSpec {
    let mut inputs: Vec<AudioInputInfo> = (1..=external)
        .map(|id| AudioInputInfo { id, port_type })
        .collect();
    inputs.extend(
        extras
            .iter()
            .map(|&(id, port_type)| AudioInputInfo { id, port_type }),
    );
    inputs.extend((1..=u16::from(media_players)).map(|i| AudioInputInfo {
        id: 2000 + i,
        port_type: AudioPortType::MediaPlayer,
    }));
    AudioSpec::Classic(ClassicAudioSpec { inputs })
}

fn fairlight_audio(
    external: u16,
    port_type: AudioPortType,
    extras: &[(u16, AudioPortType)],
    media_players: u8,
    monitor: Option<FairlightMonitorSpec>,
    audio_routing: Option<AudioRoutingSpec>,
) -> AudioSpec {
    let mut inputs: Vec<FairlightInputInfo> = (1..=external)
        .map(|id| FairlightInputInfo {
            id,
            port_type,
            max_delay: Some(8),
        })
        .collect();
    inputs.extend(extras.iter().map(|&(id, port_type)| FairlightInputInfo {
        id,
        port_type,
        max_delay: Some(8),
    }));
    inputs.extend((1..=u16::from(media_players)).map(|i| FairlightInputInfo {
        id: 2000 + i,
        port_type: AudioPortType::MediaPlayer,
        max_delay: None,
    }));
    AudioSpec::Fairlight(FairlightAudioSpec {
        inputs,
        monitor,
        audio_routing,
    })
}

fn endpoint(id: u16, name: String, pairs: u16) -> AudioRoutingEndpoint {
    AudioRoutingEndpoint {
        id,
        name,
        channel_pairs: (0..pairs).filter_map(AudioChannelPair::from_index).collect(),
    }
}

/// Embedded SDI carries 16 channels (8 pairs); analog mics carry one pair
fn routing_matrix(external: u16, mics: u16, outputs: u8) -> AudioRoutingSpec {
    let mut sources: Vec<AudioRoutingEndpoint> = (1..=external)
        .map(|i| endpoint(i, format!("Input {}", i), 8))
        .collect();
    sources.extend((1..=mics).map(|i| endpoint(1300 + i, format!("Mic {}", i), 1)));
    sources.push(endpoint(10010, "Program".to_string(), 1));

    let outputs = (1..=u16::from(outputs))
        .map(|i| endpoint(i, format!("SDI Output {}", i), 8))
        .collect();

    AudioRoutingSpec { sources, outputs }
}

fn tvs(id: ModelId, label: &str) -> ModelSpec {
    ModelSpec {
        auxes: 1,
        usks: 1,
        dsks: 2,
        multiviewers: 1,
        multiviewer_windows: 10,
        media: media(2, 20, 0),
        inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(8)
            .add_media_players(2)
            .add_upstream_key_masks(1)
            .add_downstream_key_masks(2)
            .add_clean_feeds(2)
            .add_auxiliary_outputs(1)
            .add_multiviewers(1)
            .add_program_preview()
            .generate(),
        audio: classic_audio(8, AudioPortType::Sdi, &[(1001, AudioPortType::Xlr)], 2),
        ..base(id, label)
    }
}

fn two_me(id: ModelId, label: &str, external: u16, players: u8) -> ModelSpec {
    ModelSpec {
        auxes: 6,
        mixeffects: 2,
        usks: 4,
        dsks: 2,
        multiviewers: 2,
        multiviewer_windows: 10,
        super_sources: 1,
        media: media(players, 32, 2),
        inputs: VideoInputGenerator::begin(2, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(external)
            .add_media_players(players)
            .add_upstream_key_masks(8)
            .add_downstream_key_masks(2)
            .add_super_sources(1)
            .add_clean_feeds(2)
            .add_auxiliary_outputs(6)
            .add_multiviewers(2)
            .add_program_preview()
            .generate(),
        audio: classic_audio(
            external,
            AudioPortType::Sdi,
            &[(1001, AudioPortType::Xlr), (1201, AudioPortType::Rca)],
            players,
        ),
        ..base(id, label)
    }
}

fn constellation(id: ModelId, label: &str, mes: u8, external: u16, auxes: u8) -> ModelSpec {
    let super_sources = match mes {
        1 => 0,
        2 => 1,
        _ => 2,
    };
    let dsks = if mes >= 4 { 4 } else { 2 };
    let players = if mes >= 4 { 4 } else { 2 };
    ModelSpec {
        auxes,
        mixeffects: mes,
        usks: 4,
        dsks,
        multiviewers: mes,
        multiviewer_windows: 16,
        super_sources,
        media: media(players, 64, 2),
        inputs: VideoInputGenerator::begin(mes, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(external)
            .add_media_players(players)
            .add_upstream_key_masks(mes * 4)
            .add_downstream_key_masks(dsks)
            .add_super_sources(super_sources)
            .add_clean_feeds(4)
            .add_auxiliary_outputs(auxes)
            .add_multiviewers(mes)
            .add_program_preview()
            .generate(),
        audio: fairlight_audio(
            external,
            AudioPortType::Sdi,
            &[(1301, AudioPortType::Mic), (1302, AudioPortType::Mic)],
            players,
            Some(FairlightMonitorSpec::Monitor),
            (mes >= 4).then(|| routing_matrix(external, 2, auxes)),
        ),
        ..base(id, label)
    }
}

fn mini(id: ModelId, label: &str, pro: bool, iso: bool, multiviewers: u8) -> ModelSpec {
    ModelSpec {
        auxes: 1,
        usks: 1,
        dsks: 1,
        multiviewers,
        multiviewer_windows: if multiviewers > 0 { 10 } else { 0 },
        media: media(1, 20, 0),
        streaming: pro,
        recording: pro,
        record_iso: iso,
        inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(4)
            .add_media_players(1)
            .add_upstream_key_masks(1)
            .add_downstream_key_masks(1)
            .add_auxiliary_outputs(1)
            .add_multiviewers(multiviewers)
            .add_program_preview()
            .generate(),
        audio: fairlight_audio(
            4,
            AudioPortType::Hdmi,
            &[(1301, AudioPortType::Mic), (1302, AudioPortType::Mic)],
            0,
            None,
            None,
        ),
        ..base(id, label)
    }
}

fn mini_extreme(id: ModelId, label: &str, iso: bool) -> ModelSpec {
    ModelSpec {
        auxes: 2,
        usks: 4,
        dsks: 2,
        multiviewers: 1,
        multiviewer_windows: 16,
        super_sources: 1,
        media: media(2, 20, 0),
        streaming: true,
        recording: true,
        record_iso: iso,
        inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(8)
            .add_media_players(2)
            .add_upstream_key_masks(4)
            .add_downstream_key_masks(2)
            .add_super_sources(1)
            .add_auxiliary_outputs(2)
            .add_multiviewers(1)
            .add_program_preview()
            .generate(),
        audio: fairlight_audio(
            8,
            AudioPortType::Hdmi,
            &[(1301, AudioPortType::Mic), (1302, AudioPortType::Mic)],
            0,
            Some(FairlightMonitorSpec::Headphones),
            None,
        ),
        ..base(id, label)
    }
}

fn sdi(id: ModelId, label: &str, pro_iso: bool, multiviewers: u8) -> ModelSpec {
    ModelSpec {
        auxes: 1,
        usks: 1,
        dsks: 1,
        multiviewers,
        multiviewer_windows: if multiviewers > 0 { 10 } else { 0 },
        media: media(1, 20, 0),
        streaming: pro_iso,
        recording: pro_iso,
        record_iso: pro_iso,
        inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(4)
            .add_media_players(1)
            .add_upstream_key_masks(1)
            .add_downstream_key_masks(1)
            .add_auxiliary_outputs(1)
            .add_multiviewers(multiviewers)
            .add_program_preview()
            .generate(),
        audio: fairlight_audio(
            4,
            AudioPortType::Sdi,
            &[(1301, AudioPortType::Mic), (1302, AudioPortType::Mic)],
            0,
            None,
            None,
        ),
        ..base(id, label)
    }
}

fn tvs_hd8(id: ModelId, label: &str, iso: bool) -> ModelSpec {
    ModelSpec {
        auxes: 2,
        usks: 4,
        dsks: 2,
        multiviewers: 1,
        multiviewer_windows: 16,
        super_sources: 1,
        media: media(2, 20, 0),
        streaming: true,
        recording: iso,
        record_iso: iso,
        inputs: VideoInputGenerator::begin(1, SourceAvailability::ALL)
            .add_internal_colors_and_black(true)
            .add_external_inputs(8)
            .add_media_players(2)
            .add_upstream_key_masks(4)
            .add_downstream_key_masks(2)
            .add_super_sources(1)
            .add_clean_feeds(1)
            .add_auxiliary_outputs(2)
            .add_multiviewers(1)
            .add_direct_inputs(8)
            .add_program_preview()
            .generate(),
        audio: fairlight_audio(
            8,
            AudioPortType::Sdi,
            &[(1301, AudioPortType::Mic), (1302, AudioPortType::Mic)],
            2,
            Some(FairlightMonitorSpec::Headphones),
            Some(routing_matrix(8, 2, 2)),
        ),
        ..base(id, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constellation_4me_has_routing() {
        let spec = ALL_MODELS
            .iter()
            .find(|m| m.id == ModelId::CONSTELLATION_HD_4ME)
            .unwrap();
        let routing = spec
            .fairlight_audio()
            .and_then(|f| f.audio_routing.as_ref())
            .unwrap();
        assert_eq!(routing.outputs.len(), 24);
        assert!(routing.sources.iter().any(|s| s.id == 1301));
    }

    #[test]
    fn test_mini_has_no_multiviewer() {
        let spec = ALL_MODELS.iter().find(|m| m.id == ModelId::MINI).unwrap();
        assert_eq!(spec.multiviewers, 0);
        assert_eq!(spec.multiviewer_windows, 0);
        assert!(spec.input(9001).is_none());
        assert!(!spec.streaming);
    }

    #[test]
    fn test_two_me_outputs() {
        let spec = ALL_MODELS.iter().find(|m| m.id == ModelId::TWO_ME).unwrap();
        assert_eq!(spec.mixeffects, 2);
        assert!(spec.input(10010).unwrap().selectable_on_me(1));
        assert!(!spec.input(10020).unwrap().selectable_on_me(1));
    }
}
