//! Client-side API stub for talking to a frontend.

use tokio::net::TcpStream;

use crate::messages::{
    ApiReply, ApiRequest, Command, CommandResult, RequestId, ServiceAddr,
};
use crate::utils::{recv_msg, send_msg, ReplikvError};

/// Frontend API connection stub holding one persistent connection.
pub struct FrontendApiStub {
    /// Established connection to the frontend.
    conn: TcpStream,

    /// Next request ID, monotonically increasing.
    next_req: RequestId,
}

impl FrontendApiStub {
    /// Connects to the given frontend address.
    pub async fn connect(frontend: ServiceAddr) -> Result<Self, ReplikvError> {
        pf_debug!("connecting to frontend '{}'...", frontend);
        let conn = TcpStream::connect(frontend).await?;
        Ok(FrontendApiStub { conn, next_req: 0 })
    }

    /// Issues one command and waits for its reply.
    pub async fn issue(
        &mut self,
        cmd: Command,
    ) -> Result<CommandResult, ReplikvError> {
        let id = self.next_req;
        self.next_req += 1;

        send_msg(&mut self.conn, &ApiRequest { id, cmd }).await?;
        let reply: ApiReply = recv_msg(&mut self.conn).await?;
        if reply.id != id {
            return logged_err!(
                "reply ID mismatch: expected {}, got {}",
                id,
                reply.id
            );
        }

        Ok(reply.result)
    }
}
