use dpidissect::dump::{info_line, result_to_dump};
use dpidissect::{dissect, parse, DissectStatus, DissectorRegistry, Schema};
use pcap_parser::pcapng::Block as PcapNgBlock;
use pcap_parser::traits::{PcapNGPacketBlock, PcapReaderIterator};
use pcap_parser::{Linktype, PcapBlockOwned, PcapError};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

/// One extracted IPv4/UDP datagram.
struct Datagram<'a> {
    source: IpAddr,
    dst_port: u16,
    payload: &'a [u8],
}

#[derive(Default)]
struct Stats {
    packets: u64,
    udp_payloads: u64,
    skipped_empty: u64,
    unmatched: u64,
    valid: u64,
    warnings: u64,
    truncated: u64,
    first_errors: HashMap<IpAddr, String>,
}

fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let src = std::fs::read_to_string(path)?;
    parse(&src).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
}

fn main() -> anyhow::Result<()> {
    let mut raw_args: Vec<String> = std::env::args().skip(1).collect();
    let dump = if let Some(pos) = raw_args.iter().position(|a| a == "--dump" || a == "-d") {
        raw_args.remove(pos);
        true
    } else {
        false
    };
    let port: Option<u16> = raw_args
        .iter()
        .position(|a| a.starts_with("--port="))
        .and_then(|pos| {
            let arg = raw_args.remove(pos);
            arg.strip_prefix("--port=").and_then(|s| s.parse().ok())
        });
    // Per-source bindings: --for=10.0.0.1=sensor_a.dsl (repeatable).
    let mut bindings: Vec<(IpAddr, PathBuf)> = Vec::new();
    while let Some(pos) = raw_args.iter().position(|a| a.starts_with("--for=")) {
        let arg = raw_args.remove(pos);
        let rest = arg.strip_prefix("--for=").unwrap_or_default();
        let (ip_str, dsl_str) = rest
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("--for expects <ip>=<dsl path>, got {}", rest))?;
        let ip: IpAddr = ip_str
            .parse()
            .map_err(|e| anyhow::anyhow!("--for address {}: {}", ip_str, e))?;
        bindings.push((ip, PathBuf::from(dsl_str)));
    }
    let mut args = raw_args.into_iter();
    let pcap_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: dissect_pcap <pcap> <schema.dsl> [--port=N] [--for=<ip>=<dsl>] [--dump]"))?;
    let dsl_path: PathBuf = args
        .next()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("usage: dissect_pcap <pcap> <schema.dsl> [--port=N] [--for=<ip>=<dsl>] [--dump]"))?;

    let mut registry = DissectorRegistry::new();
    registry.set_fallback(load_schema(&dsl_path)?);
    for (ip, path) in bindings {
        registry.register(ip, load_schema(&path)?);
    }

    let mut stats = Stats::default();

    // Probe file type (pcap vs pcapng) using the magic at start of file.
    let mut probe = [0u8; 4];
    {
        let mut f = File::open(&pcap_path)?;
        f.read_exact(&mut probe)?;
    }
    let file = File::open(&pcap_path)?;
    if probe == [0x0a, 0x0d, 0x0d, 0x0a] {
        run_pcapng(file, &registry, port, dump, &mut stats)?;
    } else {
        run_legacy_pcap(file, &registry, port, dump, &mut stats)?;
    }

    eprintln!("pcap: {}", pcap_path.display());
    eprintln!("schema: {}", dsl_path.display());
    eprintln!("packets: {}", stats.packets);
    eprintln!("udp payloads: {}", stats.udp_payloads);
    eprintln!("valid: {}", stats.valid);
    eprintln!("warnings: {}", stats.warnings);
    eprintln!("truncated: {}", stats.truncated);
    if stats.skipped_empty > 0 {
        eprintln!("skipped (empty payload): {}", stats.skipped_empty);
    }
    if stats.unmatched > 0 {
        eprintln!("no schema for source: {}", stats.unmatched);
    }
    if !stats.first_errors.is_empty() {
        let mut sources: Vec<_> = stats.first_errors.into_iter().collect();
        sources.sort_by_key(|(ip, _)| ip.to_string());
        eprintln!("first error per source:");
        for (ip, err) in sources {
            eprintln!("  {}: {}", ip, err);
        }
    }

    Ok(())
}

fn run_legacy_pcap<R: Read>(
    file: R,
    registry: &DissectorRegistry,
    port: Option<u16>,
    dump: bool,
    stats: &mut Stats,
) -> anyhow::Result<()> {
    let mut reader = pcap_parser::pcap::LegacyPcapReader::new(1 << 20, file)?;
    let mut linktype: Option<Linktype> = None;
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                match block {
                    PcapBlockOwned::LegacyHeader(h) => linktype = Some(h.network),
                    PcapBlockOwned::Legacy(b) => {
                        stats.packets += 1;
                        let lt = linktype.unwrap_or(Linktype(1));
                        if let Some(dgram) = udp_datagram_from_linktype(lt, b.data) {
                            process_datagram(registry, &dgram, port, dump, stats);
                        }
                    }
                    PcapBlockOwned::NG(_) => {}
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| anyhow::anyhow!("pcap refill error: {:?}", e))?;
            }
            Err(e) => return Err(anyhow::anyhow!("pcap read error: {:?}", e)),
        }
    }
    Ok(())
}

fn run_pcapng<R: Read>(
    file: R,
    registry: &DissectorRegistry,
    port: Option<u16>,
    dump: bool,
    stats: &mut Stats,
) -> anyhow::Result<()> {
    let mut reader = pcap_parser::pcapng::PcapNGReader::new(1 << 20, file)?;
    let mut if_linktypes: Vec<Linktype> = Vec::new();
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                if let PcapBlockOwned::NG(b) = block {
                    match &b {
                        PcapNgBlock::InterfaceDescription(idb) => if_linktypes.push(idb.linktype),
                        PcapNgBlock::EnhancedPacket(epb) => {
                            stats.packets += 1;
                            let lt = if_linktypes
                                .get(epb.if_id as usize)
                                .copied()
                                .unwrap_or(Linktype(1));
                            if let Some(dgram) = udp_datagram_from_linktype(lt, epb.packet_data()) {
                                process_datagram(registry, &dgram, port, dump, stats);
                            }
                        }
                        PcapNgBlock::SimplePacket(spb) => {
                            stats.packets += 1;
                            let lt = if_linktypes.first().copied().unwrap_or(Linktype(1));
                            if let Some(dgram) = udp_datagram_from_linktype(lt, spb.packet_data()) {
                                process_datagram(registry, &dgram, port, dump, stats);
                            }
                        }
                        _ => {}
                    }
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| anyhow::anyhow!("pcapng refill error: {:?}", e))?;
            }
            Err(e) => return Err(anyhow::anyhow!("pcapng read error: {:?}", e)),
        }
    }
    Ok(())
}

fn process_datagram(
    registry: &DissectorRegistry,
    dgram: &Datagram<'_>,
    port: Option<u16>,
    dump: bool,
    stats: &mut Stats,
) {
    if let Some(p) = port {
        if dgram.dst_port != p {
            return;
        }
    }
    stats.udp_payloads += 1;
    let schema = match registry.schema_for(dgram.source) {
        Some(s) => s,
        None => {
            stats.unmatched += 1;
            return;
        }
    };
    match dissect(schema, dgram.payload) {
        None => stats.skipped_empty += 1,
        Some(result) => {
            match result.status {
                DissectStatus::Valid => stats.valid += 1,
                DissectStatus::Warnings => stats.warnings += 1,
                DissectStatus::Truncated => stats.truncated += 1,
            }
            if let Some(first) = result.diagnostics.first() {
                stats
                    .first_errors
                    .entry(dgram.source)
                    .or_insert_with(|| first.message.clone());
            }
            if dump {
                println!(
                    "=== packet {}  {} -> :{}  ({}) ===",
                    stats.packets,
                    dgram.source,
                    dgram.dst_port,
                    schema.protocol()
                );
                println!("{}", result_to_dump(&result));
                println!("info: {}", info_line(&result));
            }
        }
    }
}

/// Extract an IPv4/UDP datagram from a captured frame, using linktype and
/// IPv4/UDP length fields. This avoids including Ethernet padding in short
/// frames.
fn udp_datagram_from_linktype(linktype: Linktype, frame: &[u8]) -> Option<Datagram<'_>> {
    let l3 = match linktype.0 {
        1 => ethernet_l3(frame)?,    // DLT_EN10MB
        101 => frame,                // DLT_RAW
        113 => linux_sll_l3(frame)?, // DLT_LINUX_SLL
        _ => return None,
    };
    ipv4_udp_datagram(l3)
}

fn ethernet_l3(frame: &[u8]) -> Option<&[u8]> {
    if frame.len() < 14 {
        return None;
    }
    let mut off = 12usize;
    let mut ethertype = u16::from_be_bytes([frame[off], frame[off + 1]]);
    off += 2;
    // VLAN tags (802.1Q / 802.1ad): skip tag (4 bytes) and read next ethertype.
    while ethertype == 0x8100 || ethertype == 0x88a8 {
        if frame.len() < off + 4 + 2 {
            return None;
        }
        off += 4;
        ethertype = u16::from_be_bytes([frame[off], frame[off + 1]]);
        off += 2;
    }
    match ethertype {
        0x0800 => Some(&frame[off..]), // IPv4
        _ => None,
    }
}

fn linux_sll_l3(frame: &[u8]) -> Option<&[u8]> {
    // Linux cooked capture v1 (SLL): 16-byte header, protocol at bytes 14..16
    if frame.len() < 16 {
        return None;
    }
    let proto = u16::from_be_bytes([frame[14], frame[15]]);
    match proto {
        0x0800 => Some(&frame[16..]), // IPv4
        _ => None,
    }
}

fn ipv4_udp_datagram(l3: &[u8]) -> Option<Datagram<'_>> {
    if l3.len() < 20 {
        return None;
    }
    let ver_ihl = l3[0];
    if (ver_ihl >> 4) != 4 {
        return None;
    }
    let ihl = (ver_ihl & 0x0f) as usize * 4;
    if ihl < 20 || l3.len() < ihl {
        return None;
    }
    let total_len = u16::from_be_bytes([l3[2], l3[3]]) as usize;
    if total_len < ihl {
        return None;
    }
    let l3_trunc = if total_len <= l3.len() { &l3[..total_len] } else { l3 };
    if l3_trunc.len() < ihl + 8 {
        return None;
    }
    if l3_trunc[9] != 17 {
        return None; // not UDP
    }
    let source = IpAddr::V4(Ipv4Addr::new(l3[12], l3[13], l3[14], l3[15]));
    let udp = &l3_trunc[ihl..];
    if udp.len() < 8 {
        return None;
    }
    let dst_port = u16::from_be_bytes([udp[2], udp[3]]);
    let udp_len = u16::from_be_bytes([udp[4], udp[5]]) as usize;
    if udp_len < 8 || udp.len() < udp_len {
        return None;
    }
    Some(Datagram {
        source,
        dst_port,
        payload: &udp[8..udp_len],
    })
}
