//! CSV output formatting.

use crate::scanner::{DisplayFilter, ScanReport};
use std::io::{self, Write};

/// Print results in CSV format.
pub fn print_csv(report: &ScanReport, filter: DisplayFilter) -> io::Result<()> {
    write_csv(io::stdout().lock(), report, filter)
}

fn write_csv<W: Write>(writer: W, report: &ScanReport, filter: DisplayFilter) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(["port", "status", "service", "banner", "error_detail"])?;

    for result in report.visible(filter) {
        wtr.write_record([
            result.port.to_string().as_str(),
            result.status.to_string().as_str(),
            result.service.as_deref().unwrap_or(""),
            result.banner.as_deref().unwrap_or(""),
            result.error_detail.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{PortCounts, ProbeResult};
    use crate::types::Port;
    use chrono::Utc;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_csv_rows() {
        let port = |p| Port::new(p).unwrap();
        let report = ScanReport {
            target: "localhost".to_string(),
            resolved_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            started_at: Utc::now(),
            duration: 0.5,
            total_ports_scanned: 2,
            counts: PortCounts::default(),
            cancelled: false,
            results: vec![
                ProbeResult::open(port(21), Some("220 FTP, ready".to_string())).with_service("ftp"),
                ProbeResult::closed(port(22)),
            ],
        };

        let mut buf = Vec::new();
        write_csv(&mut buf, &report, DisplayFilter::All).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "port,status,service,banner,error_detail\n\
             21,open,ftp,\"220 FTP, ready\",\n\
             22,closed,,,\n"
        );
    }
}
