//! TCP 链路（主动外连）
//!
//! 使用阻塞 connect（带超时）建立连接，之后切到非阻塞模式并注册到
//! `mio::Poll` 做读就绪轮询。连接建立即关闭 Nagle（telemetry 帧小而
//! 频繁，延迟敏感）。

use std::io::{self, Read, Write};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};
use tracing::debug;

use crate::{Link, LinkError};

const RX_TOKEN: Token = Token(0);

/// TCP 遥测链路
pub struct TcpLink {
    stream: mio::net::TcpStream,
    poll: Poll,
    events: Events,
    /// mio 的就绪通知是边沿触发的：一次事件可能对应多次读取。
    /// 这里把就绪状态粘滞住，读到 WouldBlock 才清除，向上提供
    /// 水平触发语义（poll 不消费数据）。
    readable: bool,
}

impl TcpLink {
    /// 连接到目标地址
    pub fn connect(addr: IpAddr, port: u16, timeout: Duration) -> Result<Self, LinkError> {
        let target = SocketAddr::new(addr, port);
        let std_stream = std::net::TcpStream::connect_timeout(&target, timeout)?;
        std_stream.set_nodelay(true)?;
        std_stream.set_nonblocking(true)?;

        let mut stream = mio::net::TcpStream::from_std(std_stream);
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut stream, RX_TOKEN, Interest::READABLE)?;

        debug!("TCP link connected to {}", target);
        Ok(Self {
            stream,
            poll,
            events: Events::with_capacity(4),
            readable: false,
        })
    }
}

impl Link for TcpLink {
    fn poll(&mut self, timeout: Duration) -> Result<bool, LinkError> {
        if self.readable {
            return Ok(true);
        }
        self.events.clear();
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => {
                self.readable = !self.events.is_empty();
                Ok(self.readable)
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        match self.stream.read(buf) {
            // 读到 0 字节表示对端关闭
            Ok(0) => Err(LinkError::Closed),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.readable = false;
                Ok(0)
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, LinkError> {
        match self.stream.write(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_connect_read_write() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            sock.write_all(&[1, 2, 3]).unwrap();
            let mut buf = [0u8; 8];
            let n = sock.read(&mut buf).unwrap();
            (n, buf)
        });

        let mut link = TcpLink::connect(
            IpAddr::from([127, 0, 0, 1]),
            port,
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(link.poll(Duration::from_secs(2)).unwrap());
        let mut buf = [0u8; 8];
        let n = link.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3]);

        assert_eq!(link.write(&[9, 8]).unwrap(), 2);
        let (n, buf) = server.join().unwrap();
        assert_eq!(&buf[..n], &[9, 8]);
    }

    #[test]
    fn test_poll_times_out_without_data() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut link = TcpLink::connect(
            IpAddr::from([127, 0, 0, 1]),
            port,
            Duration::from_secs(2),
        )
        .unwrap();
        // 对端保持连接但不发送任何数据
        let _peer = listener.accept().unwrap();

        assert!(!link.poll(Duration::from_millis(10)).unwrap());
        let mut buf = [0u8; 8];
        assert_eq!(link.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_connect_refused() {
        // 端口 1 基本不会有服务监听
        let result = TcpLink::connect(
            IpAddr::from([127, 0, 0, 1]),
            1,
            Duration::from_millis(200),
        );
        assert!(result.is_err());
    }
}
