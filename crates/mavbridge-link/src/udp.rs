//! UDP 链路（bind-and-peer）
//!
//! 绑定本地监听端口，向固定对端发送；一旦收到数据报，就把最近的
//! 发送方采纳为新的写对端（自驾仪常从随机源端口回发）。

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use mio::{Events, Interest, Poll, Token};
use tracing::{debug, trace};

use crate::{Link, LinkError};

const RX_TOKEN: Token = Token(0);

/// UDP 遥测链路
pub struct UdpLink {
    socket: mio::net::UdpSocket,
    poll: Poll,
    events: Events,
    /// 当前写对端（初始为配置对端，之后跟随最近的发送方）
    peer: SocketAddr,
    /// 粘滞就绪标志（mio 边沿触发 -> 水平触发语义）
    readable: bool,
}

impl UdpLink {
    /// 绑定监听端口并记录对端
    pub fn bind(listen_port: u16, peer_addr: IpAddr, peer_port: u16) -> Result<Self, LinkError> {
        let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), listen_port);
        let mut socket = mio::net::UdpSocket::bind(bind_addr)?;

        let poll = Poll::new()?;
        poll.registry()
            .register(&mut socket, RX_TOKEN, Interest::READABLE)?;

        debug!("UDP link listening on {}", bind_addr);
        Ok(Self {
            socket,
            poll,
            events: Events::with_capacity(4),
            peer: SocketAddr::new(peer_addr, peer_port),
            readable: false,
        })
    }

    /// 当前写对端
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Link for UdpLink {
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
        match self.socket.recv_from(buf) {
            Ok((n, from)) => {
                // 对端采纳：回发跟随最近的发送方
                if from != self.peer {
                    trace!("UDP peer adopted: {} -> {}", self.peer, from);
                    self.peer = from;
                }
                Ok(n)
            },
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.readable = false;
                Ok(0)
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, LinkError> {
        match self.socket.send_to(buf, self.peer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}
